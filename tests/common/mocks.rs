//! Mock version of a persistent object.
use mockall::mock;

use persistent_doc::{core::node::ContainerNode, core::object::PersistentObject, PersistError};

mock! {
    pub Object {}
    impl PersistentObject for Object {
        fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError>;
        fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError>;
    }
}
