#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 <div align="center">
   <h1>persistent-doc</h1>
   <h3>Format-agnostic persistence for settings and application objects</h3>

   ![license](https://shields.io/badge/license-MIT%2FApache--2.0-blue)

  </div>

 # persistent-doc

 **persistent-doc** lets application objects save and restore themselves to a
 hierarchical document without knowing whether that document is JSON or XML.
 Objects describe their fields once, through a small set of read/write
 primitives, and the same code round-trips through either format.

 ## Core Concepts

- **PersistentObject:** a type that reads itself from and writes itself into a `ContainerNode`.
- **ContainerNode:** a cursor over one position of a document. In named-member mode every primitive addresses a field by name; in array mode the primitives consume (or append) the elements of an array one at a time.
- **PersistentDocument:** owns the tree, loads and saves it from files or strings, and forwards every primitive to its root node.
- **Backends:** `JsonDocument` (over `serde_json`) and `XmlDocument` (over `quick-xml`).

 ## Features

| **Feature** | **Description**                          |
|-------------|------------------------------------------|
| json        | Enables the JSON document backend        |
| xml         | Enables the XML document backend         |
| full        | Enables all available features           |

 ## Getting Started

```toml
[dependencies]
persistent-doc = { version = "<version>", features = ["<full|json|xml>"] }
```

Then, on your main.rs:

```rust
# use persistent_doc::{
#     backend::{json::JsonDocument, xml::XmlDocument},
#     core::{document::PersistentDocument, node::ContainerNode, object::PersistentObject},
#     error::PersistError,
# };
#[derive(Default, Debug, PartialEq)]
struct LogConfig {
    filename: String,
    level: u32,
    servers: Vec<String>,
}

impl PersistentObject for LogConfig {
    fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut log = node.read_container("log")?;
        self.filename = log.read_string("filename")?;
        self.level = log.read_uint("level")?;
        self.servers = log.read_string_vector("servers")?;
        Ok(())
    }

    fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError> {
        let mut log = node.write_new_container("log")?;
        log.write_string("filename", &self.filename)?;
        log.write_uint("level", self.level)?;
        log.write_string_vector("servers", &self.servers)
    }
}

fn round_trip<D: PersistentDocument>(
    mut saved: D,
    mut loaded: D,
    config: &LogConfig,
) -> Result<LogConfig, PersistError> {
    saved.write_object(config)?;
    loaded.load_string(&saved.save_string()?)?;

    let mut restored = LogConfig::default();
    loaded.read_object(&mut restored)?;
    Ok(restored)
}

fn main() -> Result<(), PersistError> {
    let config = LogConfig {
        filename: "pjsip.log".to_string(),
        level: 5,
        servers: vec!["sip.example.com".to_string()],
    };

    assert_eq!(round_trip(JsonDocument::new(), JsonDocument::new(), &config)?, config);
    assert_eq!(round_trip(XmlDocument::new(), XmlDocument::new(), &config)?, config);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 */

/// Core module for persistent documents
pub mod core;

/// Error types for persistent documents
pub mod error;

#[doc(inline)]
pub use error::*;

/// Document backends (JSON and XML)
pub mod backend;
