pub mod format;
pub mod gauge;

pub use gauge::GaugeView;
