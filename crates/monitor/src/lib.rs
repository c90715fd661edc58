// exports
pub mod image;
pub mod irq;
pub mod monitor;
