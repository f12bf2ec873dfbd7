//! FFI boundary with the C++ Metamod bridge

pub mod bridge;
pub mod exports;

pub use bridge::{BridgedEvent, EventBridge, FfiPlayerInfo, FfiQAngle, FfiVector, HostBridge, NativeHost};
