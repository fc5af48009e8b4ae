#[cfg(test)]
pub mod test {
    use confique::Config;
    use serde::{Deserialize, Serialize};

    /// Typed target shared by the resolve, validate and builder tests.
    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestConfig {
        /// Bind address, `--host`.
        #[config(default = "localhost")]
        pub host: String,

        /// Listen port, `--port`.
        #[config(default = 8080)]
        pub port: u16,

        /// `--debug` / `--no-debug`.
        #[config(default = false)]
        pub debug: bool,

        /// Repeatable `--tags`.
        pub tags: Option<Vec<String>>,

        /// `--database.*` or `--database @db.json`.
        #[config(nested)]
        pub database: TestDbConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestDbConfig {
        pub url: Option<String>,

        /// Spelled `--database.pool-size` on the command line.
        #[config(default = 5)]
        pub pool_size: usize,
    }

    #[test]
    fn empty_command_line_gives_defaults() {
        let config = TestConfig::builder().load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.tags, None);
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.pool_size, 5);
    }

    // -- Required field without default -----------------------------------------

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct RequiredConfig {
        pub name: String,

        #[config(default = 1)]
        pub replicas: u32,
    }

    // -- String leaf into a closed enum -----------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Mode {
        Fast,
        Slow,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct EnumConfig {
        #[config(default = "fast")]
        pub mode: Mode,
    }
}
