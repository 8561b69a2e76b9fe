//! Control-plane state infrastructure - store backends, connection handle,
//! reader and writer

mod client;
mod etcd;
mod factory;
mod in_memory;
mod reader;
mod writer;

pub use client::StateClient;
pub use etcd::EtcdStore;
pub use factory::{Credentials, StoreConfig, StoreFactory, StoreType, DEFAULT_DIAL_TIMEOUT};
pub use in_memory::InMemoryStore;
pub use reader::StateReader;
pub use writer::StateWriter;
