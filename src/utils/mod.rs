pub mod helper;

mod ring_buffer;
pub use ring_buffer::RingBuffer;

mod ols;
pub use ols::Ols;

#[cfg(test)]
pub(crate) mod testing;
