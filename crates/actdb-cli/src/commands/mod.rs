pub mod build;
pub mod dwell;
pub mod flux;
pub mod schedule;

use std::error::Error;

use actdb_core::canonical_json_bytes;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    let bytes = canonical_json_bytes(value)?;
    println!("{}", String::from_utf8(bytes)?);
    Ok(())
}
