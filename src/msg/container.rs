//! Reading MAPI properties out of the OLE compound file behind a `.msg`.
//!
//! The compound-file layout itself is handled by the `cfb` crate. This
//! module only knows where Outlook stores each property:
//!
//! - variable-length values live in streams named `__substg1.0_IIIITTTT`
//!   (property id and type in hex);
//! - fixed-length values (integers, timestamps) live in the
//!   `__properties_version1.0` stream of the same storage;
//! - each recipient has its own `__recip_version1.0_#NNNNNNNN` storage.

use std::cell::Cell;
use std::io::{Cursor, Read, Seek};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use byteorder::{ByteOrder, LittleEndian};
use cfb::CompoundFile;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::properties::{MsgProperties, Recipient, RecipientKind};

// Property types
const PT_LONG: u16 = 0x0003;
const PT_SYSTIME: u16 = 0x0040;
const PT_STRING8: u16 = 0x001E;
const PT_UNICODE: u16 = 0x001F;
const PT_BINARY: u16 = 0x0102;

// Message properties
const PR_SUBJECT: u16 = 0x0037;
const PR_CLIENT_SUBMIT_TIME: u16 = 0x0039;
const PR_SENT_REPRESENTING_NAME: u16 = 0x0042;
const PR_SENT_REPRESENTING_EMAIL: u16 = 0x0065;
const PR_CONVERSATION_TOPIC: u16 = 0x0070;
const PR_CONVERSATION_INDEX: u16 = 0x0071;
const PR_TRANSPORT_MESSAGE_HEADERS: u16 = 0x007D;
const PR_SENDER_NAME: u16 = 0x0C1A;
const PR_SENDER_EMAIL_ADDRESS: u16 = 0x0C1F;
const PR_MESSAGE_DELIVERY_TIME: u16 = 0x0E06;
const PR_BODY: u16 = 0x1000;
const PR_RTF_COMPRESSED: u16 = 0x1009;
const PR_HTML: u16 = 0x1013;
const PR_INTERNET_MESSAGE_ID: u16 = 0x1035;
const PR_SENDER_SMTP_ADDRESS: u16 = 0x5D01;

// Recipient properties
const PR_RECIPIENT_TYPE: u16 = 0x0C15;
const PR_DISPLAY_NAME: u16 = 0x3001;
const PR_EMAIL_ADDRESS: u16 = 0x3003;
const PR_SMTP_ADDRESS: u16 = 0x39FE;

const PROPERTIES_STREAM: &str = "__properties_version1.0";
const RECIPIENT_PREFIX: &str = "__recip_version1.0_";

/// Size of the `__properties_version1.0` header before the first entry.
const TOP_LEVEL_HEADER_LEN: usize = 32;
const RECIPIENT_HEADER_LEN: usize = 8;
const PROPERTY_ENTRY_LEN: usize = 16;

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const FILETIME_UNIX_OFFSET: i64 = 11_644_473_600;

/// Why a container could not be turned into [`MsgProperties`].
///
/// Only ever logged, never shown to the user.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("compound file error: {0}")]
    Container(#[from] std::io::Error),

    #[error("container holds no message properties")]
    NoProperties,

    #[error("decoder panicked: {0}")]
    Panicked(String),
}

/// Source of typed message properties.
///
/// Implemented by [`CfbDecoder`] for real files; tests substitute their own.
pub trait MsgDecoder {
    fn decode(&self, data: &[u8]) -> Result<MsgProperties, DecodeError>;
}

/// Decoder backed by the `cfb` compound-file reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct CfbDecoder;

impl MsgDecoder for CfbDecoder {
    fn decode(&self, data: &[u8]) -> Result<MsgProperties, DecodeError> {
        guarded(|| decode_container(data))
    }
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the process panic hook so it stays silent while this thread is
/// inside [`guarded`]. Other panics still reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Run a decode step, turning a panic into [`DecodeError::Panicked`].
///
/// Nothing is printed for the panic; the reason only travels in the error,
/// which callers log when parser diagnostics are enabled.
fn guarded(
    f: impl FnOnce() -> Result<MsgProperties, DecodeError>,
) -> Result<MsgProperties, DecodeError> {
    install_quiet_hook();
    QUIET_PANICS.with(|q| q.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    QUIET_PANICS.with(|q| q.set(false));

    result.map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_default();
        DecodeError::Panicked(reason)
    })?
}

fn decode_container(data: &[u8]) -> Result<MsgProperties, DecodeError> {
    let mut file = CompoundFile::open(Cursor::new(data))?;

    let fixed = FixedProperties::read(&mut file, "", TOP_LEVEL_HEADER_LEN)?;

    let props = MsgProperties {
        transport_headers: string_prop(&mut file, "", PR_TRANSPORT_MESSAGE_HEADERS)?,
        subject: string_prop(&mut file, "", PR_SUBJECT)?,
        sender_name: first_string_prop(&mut file, "", &[PR_SENDER_NAME, PR_SENT_REPRESENTING_NAME])?,
        sender_email: first_string_prop(
            &mut file,
            "",
            &[
                PR_SENDER_SMTP_ADDRESS,
                PR_SENDER_EMAIL_ADDRESS,
                PR_SENT_REPRESENTING_EMAIL,
            ],
        )?,
        delivery_time: fixed.time(PR_MESSAGE_DELIVERY_TIME),
        submit_time: fixed.time(PR_CLIENT_SUBMIT_TIME),
        message_id: string_prop(&mut file, "", PR_INTERNET_MESSAGE_ID)?,
        thread_topic: string_prop(&mut file, "", PR_CONVERSATION_TOPIC)?,
        thread_index: read_stream(&mut file, &stream_path("", PR_CONVERSATION_INDEX, PT_BINARY))?,
        body_text: string_prop(&mut file, "", PR_BODY)?,
        body_html: string_prop(&mut file, "", PR_HTML)?,
        body_html_bytes: read_stream(&mut file, &stream_path("", PR_HTML, PT_BINARY))?,
        has_compressed_rtf: file.is_stream(stream_path("", PR_RTF_COMPRESSED, PT_BINARY)),
        recipients: read_recipients(&mut file)?,
    };

    if props.is_empty() && !fixed.present {
        return Err(DecodeError::NoProperties);
    }
    Ok(props)
}

fn read_recipients<F: Read + Seek>(
    file: &mut CompoundFile<F>,
) -> Result<Vec<Recipient>, DecodeError> {
    let mut storages: Vec<String> = file
        .read_root_storage()
        .filter(|entry| entry.is_storage() && entry.name().starts_with(RECIPIENT_PREFIX))
        .map(|entry| entry.name().to_string())
        .collect();
    // Suffix is a zero-padded hex index, so name order is table order
    storages.sort();

    let mut recipients = Vec::with_capacity(storages.len());
    for name in storages {
        let dir = format!("/{name}");
        let fixed = FixedProperties::read(file, &dir, RECIPIENT_HEADER_LEN)?;
        recipients.push(Recipient {
            name: string_prop(file, &dir, PR_DISPLAY_NAME)?,
            email: first_string_prop(file, &dir, &[PR_SMTP_ADDRESS, PR_EMAIL_ADDRESS])?,
            kind: RecipientKind::from_mapi(fixed.long(PR_RECIPIENT_TYPE)),
        });
    }
    Ok(recipients)
}

fn stream_path(dir: &str, id: u16, prop_type: u16) -> String {
    format!("{dir}/__substg1.0_{id:04X}{prop_type:04X}")
}

fn read_stream<F: Read + Seek>(
    file: &mut CompoundFile<F>,
    path: &str,
) -> Result<Option<Vec<u8>>, DecodeError> {
    if !file.is_stream(path) {
        return Ok(None);
    }
    let mut buf = Vec::new();
    file.open_stream(path)?.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

/// Read a string property, preferring the Unicode variant over the 8-bit one.
fn string_prop<F: Read + Seek>(
    file: &mut CompoundFile<F>,
    dir: &str,
    id: u16,
) -> Result<Option<String>, DecodeError> {
    if let Some(bytes) = read_stream(file, &stream_path(dir, id, PT_UNICODE))? {
        let (text, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(&bytes);
        return Ok(Some(text.trim_end_matches('\0').to_string()));
    }
    if let Some(bytes) = read_stream(file, &stream_path(dir, id, PT_STRING8))? {
        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
        return Ok(Some(text.trim_end_matches('\0').to_string()));
    }
    Ok(None)
}

/// First non-empty string among several candidate properties.
fn first_string_prop<F: Read + Seek>(
    file: &mut CompoundFile<F>,
    dir: &str,
    ids: &[u16],
) -> Result<Option<String>, DecodeError> {
    for &id in ids {
        if let Some(value) = string_prop(file, dir, id)? {
            if !value.trim().is_empty() {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}

/// Entries of a `__properties_version1.0` stream.
#[derive(Debug, Default)]
struct FixedProperties {
    present: bool,
    /// `(tag, value)` where tag is `id << 16 | type`.
    entries: Vec<(u32, [u8; 8])>,
}

impl FixedProperties {
    fn read<F: Read + Seek>(
        file: &mut CompoundFile<F>,
        dir: &str,
        header_len: usize,
    ) -> Result<Self, DecodeError> {
        let Some(data) = read_stream(file, &format!("{dir}/{PROPERTIES_STREAM}"))? else {
            return Ok(Self::default());
        };

        let entries = data
            .get(header_len..)
            .unwrap_or_default()
            .chunks_exact(PROPERTY_ENTRY_LEN)
            .map(|chunk| {
                let tag = LittleEndian::read_u32(&chunk[0..4]);
                let mut value = [0u8; 8];
                value.copy_from_slice(&chunk[8..16]);
                (tag, value)
            })
            .collect();

        Ok(Self {
            present: true,
            entries,
        })
    }

    fn get(&self, id: u16, prop_type: u16) -> Option<&[u8; 8]> {
        let tag = (u32::from(id) << 16) | u32::from(prop_type);
        self.entries.iter().find(|(t, _)| *t == tag).map(|(_, v)| v)
    }

    fn long(&self, id: u16) -> Option<u32> {
        self.get(id, PT_LONG).map(|v| LittleEndian::read_u32(&v[0..4]))
    }

    fn time(&self, id: u16) -> Option<DateTime<Utc>> {
        self.get(id, PT_SYSTIME)
            .and_then(|v| filetime_to_utc(LittleEndian::read_i64(v)))
    }
}

/// Convert a Windows FILETIME (100 ns ticks since 1601) to UTC.
fn filetime_to_utc(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks <= 0 {
        return None;
    }
    let secs = ticks / 10_000_000 - FILETIME_UNIX_OFFSET;
    let nanos = u32::try_from(ticks % 10_000_000).ok()? * 100;
    DateTime::from_timestamp(secs, nanos)
}
