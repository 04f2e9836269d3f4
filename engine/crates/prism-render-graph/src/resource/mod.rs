//! 资源句柄、延迟构造与共享
//!
//! - [`resource_ref`]：资源句柄，值变化时通知订阅者
//! - [`descriptor`]：延迟构造记录
//! - [`container`]：每个节点一个的资源容器，用于内存统计
//! - [`builder`]：pass 创建资源的入口
//! - [`arena`]：全局资源与跨图共享

pub mod arena;
pub mod builder;
pub mod container;
pub mod descriptor;
pub mod flags;
pub mod group;
pub mod resource_ref;
