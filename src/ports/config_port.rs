/// Read-only access to configuration values.
///
/// Keys are addressed by INI-style section and key name. String lookups
/// return `None` when absent; typed lookups carry their default with them.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
