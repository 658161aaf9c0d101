//! Speech in and out. `input` and `output` hold the session logic behind
//! small engine traits; `browser` implements those traits over web-sys.

pub mod browser;
pub mod input;
pub mod output;
