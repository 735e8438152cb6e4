mod ensure;
mod prepare;
mod show;

pub use ensure::*;
pub use prepare::*;
pub use show::*;
