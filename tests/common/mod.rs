#![allow(dead_code)]

pub mod mocks;

pub use mocks::MockObject;

use persistent_doc::{
    core::{node::ContainerNode, object::PersistentObject},
    PersistError,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two fields stored in a sub-container named by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleClass {
    element_name: String,
    pub int_value: i32,
    pub string_value: String,
}

impl SimpleClass {
    pub fn new(element_name: &str) -> Self {
        Self::with_values(element_name, 0, "")
    }

    pub fn with_values(element_name: &str, int_value: i32, string_value: &str) -> Self {
        SimpleClass {
            element_name: element_name.to_string(),
            int_value,
            string_value: string_value.to_string(),
        }
    }
}

impl PersistentObject for SimpleClass {
    fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut this_node = node.read_container(&self.element_name)?;
        self.int_value = this_node.read_int("intValue")?;
        self.string_value = this_node.read_string("stringValue")?;
        Ok(())
    }

    fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut this_node = node.write_new_container(&self.element_name)?;
        this_node.write_int("intValue", self.int_value)?;
        this_node.write_string("stringValue", &self.string_value)
    }
}

/// Logging settings of a SIP user agent.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub msg_logging: u32,
    pub level: u32,
    pub console_level: u32,
    pub decor: u32,
    pub filename: String,
    pub file_flags: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            msg_logging: 1,
            level: 5,
            console_level: 4,
            decor: 0,
            filename: String::new(),
            file_flags: 0,
        }
    }
}

impl PersistentObject for LogConfig {
    fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut this_node = node.read_container("LogConfig")?;
        self.msg_logging = this_node.read_uint("msgLogging")?;
        self.level = this_node.read_uint("level")?;
        self.console_level = this_node.read_uint("consoleLevel")?;
        self.decor = this_node.read_uint("decor")?;
        self.filename = this_node.read_string("filename")?;
        self.file_flags = this_node.read_uint("fileFlags")?;
        Ok(())
    }

    fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut this_node = node.write_new_container("LogConfig")?;
        this_node.write_uint("msgLogging", self.msg_logging)?;
        this_node.write_uint("level", self.level)?;
        this_node.write_uint("consoleLevel", self.console_level)?;
        this_node.write_uint("decor", self.decor)?;
        this_node.write_string("filename", &self.filename)?;
        this_node.write_uint("fileFlags", self.file_flags)
    }
}

/// An account with a list of proxies and nested credentials, used to compare
/// both backends on the same object graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountConfig {
    pub id_uri: String,
    pub priority: i32,
    pub register_on_add: bool,
    pub timeout: f32,
    pub proxies: Vec<String>,
    pub credentials: Vec<Credential>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credential {
    pub realm: String,
    pub username: String,
}

impl PersistentObject for Credential {
    fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut this_node = node.read_container("credential")?;
        self.realm = this_node.read_string("realm")?;
        self.username = this_node.read_string("username")?;
        Ok(())
    }

    fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut this_node = node.write_new_container("credential")?;
        this_node.write_string("realm", &self.realm)?;
        this_node.write_string("username", &self.username)
    }
}

impl PersistentObject for AccountConfig {
    fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut this_node = node.read_container("AccountConfig")?;
        self.id_uri = this_node.read_string("idUri")?;
        self.priority = this_node.read_int("priority")?;
        self.register_on_add = this_node.read_bool("registerOnAdd")?;
        self.timeout = this_node.read_float("timeout")?;
        self.proxies = this_node.read_string_vector("proxies")?;

        self.credentials.clear();
        let mut credentials = this_node.read_array("credentials")?;
        while credentials.has_unread() {
            let mut credential = Credential::default();
            credentials.read_object(&mut credential)?;
            self.credentials.push(credential);
        }
        Ok(())
    }

    fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut this_node = node.write_new_container("AccountConfig")?;
        this_node.write_string("idUri", &self.id_uri)?;
        this_node.write_int("priority", self.priority)?;
        this_node.write_bool("registerOnAdd", self.register_on_add)?;
        this_node.write_float("timeout", self.timeout)?;
        this_node.write_string_vector("proxies", &self.proxies)?;

        let mut credentials = this_node.write_new_array("credentials")?;
        for credential in &self.credentials {
            credentials.write_object(credential)?;
        }
        Ok(())
    }
}

pub fn sample_account() -> AccountConfig {
    AccountConfig {
        id_uri: "sip:alice@example.com".to_string(),
        priority: -3,
        register_on_add: true,
        timeout: 2.5,
        proxies: vec![
            "sip:proxy1.example.com;lr".to_string(),
            "sip:proxy2.example.com;lr".to_string(),
        ],
        credentials: vec![
            Credential {
                realm: "example.com".to_string(),
                username: "alice".to_string(),
            },
            Credential {
                realm: "*".to_string(),
                username: "alice & bob <ops>".to_string(),
            },
        ],
    }
}
