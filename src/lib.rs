//! Interactive terminal front-end for yt-dlp.
//!
//! The session pipeline lives in [`downloader`]; [`cli`] and [`logging`]
//! hold the process-level setup used by the binary.

pub mod cli;
pub mod downloader;
pub mod logging;
