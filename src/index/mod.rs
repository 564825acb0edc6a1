pub mod codec;
pub mod posting;
