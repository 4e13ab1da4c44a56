//! Tests for the commands that drive downloads.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_open() {
    match parse(&["plazmer", "open", "https://x.com/file.pdf"]) {
        CliCommand::Open { url, yes } => {
            assert_eq!(url, "https://x.com/file.pdf");
            assert!(!yes);
        }
        _ => panic!("expected Open"),
    }
}

#[test]
fn cli_parse_open_yes() {
    match parse(&["plazmer", "open", "-y", "blob:https://x.com/1"]) {
        CliCommand::Open { url, yes } => {
            assert_eq!(url, "blob:https://x.com/1");
            assert!(yes);
        }
        _ => panic!("expected Open with -y"),
    }
}

#[test]
fn cli_parse_download_start_defaults() {
    match parse(&["plazmer", "download-start", "https://x.com/get?id=1"]) {
        CliCommand::DownloadStart {
            url,
            content_disposition,
            mime,
            length,
            user_agent,
            yes,
        } => {
            assert_eq!(url, "https://x.com/get?id=1");
            assert!(content_disposition.is_none());
            assert!(mime.is_none());
            assert_eq!(length, 0);
            assert!(user_agent.is_none());
            assert!(!yes);
        }
        _ => panic!("expected DownloadStart"),
    }
}

#[test]
fn cli_parse_download_start_full() {
    match parse(&[
        "plazmer",
        "download-start",
        "https://x.com/get",
        "--content-disposition",
        "attachment; filename=a.pdf",
        "--mime",
        "application/pdf",
        "--length",
        "-1",
        "--user-agent",
        "Mozilla/5.0",
        "--yes",
    ]) {
        CliCommand::DownloadStart {
            content_disposition,
            mime,
            length,
            user_agent,
            yes,
            ..
        } => {
            assert_eq!(content_disposition.as_deref(), Some("attachment; filename=a.pdf"));
            assert_eq!(mime.as_deref(), Some("application/pdf"));
            assert_eq!(length, -1);
            assert_eq!(user_agent.as_deref(), Some("Mozilla/5.0"));
            assert!(yes);
        }
        _ => panic!("expected DownloadStart with options"),
    }
}

#[test]
fn cli_parse_save_blob() {
    match parse(&["plazmer", "save-blob", "aGVsbG8=", "text/plain", "5"]) {
        CliCommand::SaveBlob { base64, mime, size } => {
            assert_eq!(base64, "aGVsbG8=");
            assert_eq!(mime, "text/plain");
            assert_eq!(size, 5);
        }
        _ => panic!("expected SaveBlob"),
    }
}

#[test]
fn cli_parse_save_blob_requires_size() {
    assert!(Cli::try_parse_from(["plazmer", "save-blob", "aGVsbG8=", "text/plain"]).is_err());
}
