pub mod network;
pub mod practicum;
pub mod storage;
