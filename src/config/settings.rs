use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_NODE_ADDR: &str = "127.0.0.1:7101";
static DEFAULT_TRACKER_ADDR: &str = "127.0.0.1:7000";
static DEFAULT_CHAIN_FILE: &str = "chain.json";

const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
const TRACKER_ADDRESS_KEY: &str = "TRACKER_ADDRESS";
const CHAIN_FILE_KEY: &str = "CHAIN_FILE";

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();
        map.insert(
            String::from(NODE_ADDRESS_KEY),
            env::var(NODE_ADDRESS_KEY).unwrap_or_else(|_| String::from(DEFAULT_NODE_ADDR)),
        );
        map.insert(
            String::from(TRACKER_ADDRESS_KEY),
            env::var(TRACKER_ADDRESS_KEY).unwrap_or_else(|_| String::from(DEFAULT_TRACKER_ADDR)),
        );
        map.insert(
            String::from(CHAIN_FILE_KEY),
            env::var(CHAIN_FILE_KEY).unwrap_or_else(|_| String::from(DEFAULT_CHAIN_FILE)),
        );

        Config {
            inner: RwLock::new(map),
        }
    }

    fn get(&self, key: &str) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(key)
            .expect("Config keys are seeded at construction")
            .clone()
    }

    fn set(&self, key: &str, value: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(key), value);
    }

    /// The `ip:port` this peer listens on.
    pub fn get_node_addr(&self) -> String {
        self.get(NODE_ADDRESS_KEY)
    }

    pub fn set_node_addr(&self, addr: String) {
        self.set(NODE_ADDRESS_KEY, addr);
    }

    /// The `ip:port` of the discovery service.
    pub fn get_tracker_addr(&self) -> String {
        self.get(TRACKER_ADDRESS_KEY)
    }

    pub fn set_tracker_addr(&self, addr: String) {
        self.set(TRACKER_ADDRESS_KEY, addr);
    }

    /// Where the accepted chain is persisted.
    pub fn get_chain_file(&self) -> String {
        self.get(CHAIN_FILE_KEY)
    }

    pub fn set_chain_file(&self, path: String) {
        self.set(CHAIN_FILE_KEY, path);
    }
}
