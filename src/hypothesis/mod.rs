//! Unit root and cointegration tests
//!
//! [`adfuller`] tests a single series for a unit root, [`engle_granger`] tests whether a
//! linear combination of two series is stationary. Both report MacKinnon approximate
//! p-values through [`mackinnon_p`].

mod adf;
pub use adf::adfuller;

mod cointegration;
pub use cointegration::engle_granger;

mod mackinnon;
pub use mackinnon::mackinnon_p;
