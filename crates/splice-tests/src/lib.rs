//! Integration test crate for Splice.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every splice crate to verify they work together.

#[cfg(test)]
mod audio;

#[cfg(test)]
mod clock;

#[cfg(test)]
mod player;

#[cfg(test)]
mod video;

#[cfg(test)]
mod workspace;
