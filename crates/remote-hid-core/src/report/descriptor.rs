//! The HID report descriptor registered with the host, plus a small
//! short-item walker used to check it.
//!
//! The descriptor declares three top-level application collections:
//!
//! * **Mouse** (ID 1): five buttons, three padding bits, then X / Y / Wheel
//!   as signed 8-bit relative values in -127..=127.
//! * **Keyboard** (ID 2): eight modifier bits, one reserved byte, five LED
//!   output bits plus padding, and six key-array bytes with usages 0..=101.
//! * **Consumer control** (ID 3): one 16-bit usage in 0..=572.
//!
//! The mouse collection declares 32 input bits while [`MouseReport`] is
//! five bytes long.  The trailing pan byte sits past the declared layout;
//! hosts that parse strictly by the descriptor ignore it.
//!
//! [`MouseReport`]: crate::report::MouseReport

use thiserror::Error;

/// Combined mouse + keyboard + consumer-control report descriptor.
#[rustfmt::skip]
pub const COMBO_DESCRIPTOR: &[u8] = &[
    // ── Mouse ───────────────────────────────────────────────────────────────
    0x05, 0x01,       // Usage Page (Generic Desktop)
    0x09, 0x02,       // Usage (Mouse)
    0xA1, 0x01,       // Collection (Application)
    0x85, 0x01,       //   Report ID (1)
    0x09, 0x01,       //   Usage (Pointer)
    0xA1, 0x00,       //   Collection (Physical)
    0x05, 0x09,       //     Usage Page (Button)
    0x19, 0x01,       //     Usage Minimum (1)
    0x29, 0x05,       //     Usage Maximum (5)
    0x15, 0x00,       //     Logical Minimum (0)
    0x25, 0x01,       //     Logical Maximum (1)
    0x95, 0x05,       //     Report Count (5)
    0x75, 0x01,       //     Report Size (1)
    0x81, 0x02,       //     Input (Data, Var, Abs)
    0x95, 0x01,       //     Report Count (1)
    0x75, 0x03,       //     Report Size (3)
    0x81, 0x01,       //     Input (Const)
    0x05, 0x01,       //     Usage Page (Generic Desktop)
    0x09, 0x30,       //     Usage (X)
    0x09, 0x31,       //     Usage (Y)
    0x09, 0x38,       //     Usage (Wheel)
    0x15, 0x81,       //     Logical Minimum (-127)
    0x25, 0x7F,       //     Logical Maximum (127)
    0x75, 0x08,       //     Report Size (8)
    0x95, 0x03,       //     Report Count (3)
    0x81, 0x06,       //     Input (Data, Var, Rel)
    0xC0,             //   End Collection
    0xC0,             // End Collection

    // ── Keyboard ────────────────────────────────────────────────────────────
    0x05, 0x01,       // Usage Page (Generic Desktop)
    0x09, 0x06,       // Usage (Keyboard)
    0xA1, 0x01,       // Collection (Application)
    0x85, 0x02,       //   Report ID (2)
    0x05, 0x07,       //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0,       //   Usage Minimum (Left Control)
    0x29, 0xE7,       //   Usage Maximum (Right GUI)
    0x15, 0x00,       //   Logical Minimum (0)
    0x25, 0x01,       //   Logical Maximum (1)
    0x75, 0x01,       //   Report Size (1)
    0x95, 0x08,       //   Report Count (8)
    0x81, 0x02,       //   Input (Data, Var, Abs)
    0x95, 0x01,       //   Report Count (1)
    0x75, 0x08,       //   Report Size (8)
    0x81, 0x01,       //   Input (Const)
    0x95, 0x05,       //   Report Count (5)
    0x75, 0x01,       //   Report Size (1)
    0x05, 0x08,       //   Usage Page (LEDs)
    0x19, 0x01,       //   Usage Minimum (Num Lock)
    0x29, 0x05,       //   Usage Maximum (Kana)
    0x91, 0x02,       //   Output (Data, Var, Abs)
    0x95, 0x01,       //   Report Count (1)
    0x75, 0x03,       //   Report Size (3)
    0x91, 0x01,       //   Output (Const)
    0x95, 0x06,       //   Report Count (6)
    0x75, 0x08,       //   Report Size (8)
    0x15, 0x00,       //   Logical Minimum (0)
    0x25, 0x65,       //   Logical Maximum (101)
    0x05, 0x07,       //   Usage Page (Keyboard/Keypad)
    0x19, 0x00,       //   Usage Minimum (0)
    0x29, 0x65,       //   Usage Maximum (101)
    0x81, 0x00,       //   Input (Data, Array)
    0xC0,             // End Collection

    // ── Consumer control ────────────────────────────────────────────────────
    0x05, 0x0C,       // Usage Page (Consumer)
    0x09, 0x01,       // Usage (Consumer Control)
    0xA1, 0x01,       // Collection (Application)
    0x85, 0x03,       //   Report ID (3)
    0x19, 0x00,       //   Usage Minimum (0)
    0x2A, 0x3C, 0x02, //   Usage Maximum (572)
    0x15, 0x00,       //   Logical Minimum (0)
    0x26, 0x3C, 0x02, //   Logical Maximum (572)
    0x95, 0x01,       //   Report Count (1)
    0x75, 0x10,       //   Report Size (16)
    0x81, 0x00,       //   Input (Data, Array)
    0xC0,             // End Collection
];

/// Malformed descriptor data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("item at offset {offset} runs past the end of the descriptor")]
    Truncated { offset: usize },

    #[error("long item at offset {offset} is not supported")]
    LongItem { offset: usize },

    #[error("end collection at offset {offset} has no matching collection")]
    UnmatchedEnd { offset: usize },

    #[error("{open} collection(s) left open at end of descriptor")]
    UnclosedCollection { open: usize },
}

/// Short-item type field (bits 2..3 of the prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Main,
    Global,
    Local,
    Reserved,
}

/// One decoded short item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub offset: usize,
    pub kind: ItemKind,
    pub tag: u8,
    /// Little-endian data, zero-extended.
    pub data: u32,
    pub size: usize,
}

// Main item tags.
const TAG_INPUT: u8 = 0x8;
const TAG_OUTPUT: u8 = 0x9;
const TAG_COLLECTION: u8 = 0xA;
const TAG_END_COLLECTION: u8 = 0xC;

// Global item tags.
const TAG_REPORT_SIZE: u8 = 0x7;
const TAG_REPORT_ID: u8 = 0x8;
const TAG_REPORT_COUNT: u8 = 0x9;

const LONG_ITEM_PREFIX: u8 = 0xFE;

/// Iterator over the short items of a descriptor.
pub struct Items<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

/// Walks `bytes` item by item.  Stops after the first error.
pub fn items(bytes: &[u8]) -> Items<'_> {
    Items {
        bytes,
        pos: 0,
        failed: false,
    }
}

impl Iterator for Items<'_> {
    type Item = Result<Item, DescriptorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        let offset = self.pos;
        let prefix = self.bytes[offset];
        if prefix == LONG_ITEM_PREFIX {
            self.failed = true;
            return Some(Err(DescriptorError::LongItem { offset }));
        }

        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let start = offset + 1;
        let Some(payload) = self.bytes.get(start..start + size) else {
            self.failed = true;
            return Some(Err(DescriptorError::Truncated { offset }));
        };
        let data = payload
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

        let kind = match (prefix >> 2) & 0x03 {
            0 => ItemKind::Main,
            1 => ItemKind::Global,
            2 => ItemKind::Local,
            _ => ItemKind::Reserved,
        };

        self.pos = start + size;
        Some(Ok(Item {
            offset,
            kind,
            tag: prefix >> 4,
            data,
            size,
        }))
    }
}

/// Declared bit widths of one report ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    pub id: u8,
    pub input_bits: u32,
    pub output_bits: u32,
}

impl ReportLayout {
    pub fn input_bytes(&self) -> usize {
        self.input_bits.div_ceil(8) as usize
    }

    pub fn output_bytes(&self) -> usize {
        self.output_bits.div_ceil(8) as usize
    }
}

/// Sums the declared Input / Output bits per report ID, in order of first
/// appearance, and checks that collections are balanced.
pub fn report_layouts(bytes: &[u8]) -> Result<Vec<ReportLayout>, DescriptorError> {
    let mut layouts: Vec<ReportLayout> = Vec::new();
    let mut report_id = 0u8;
    let mut report_size = 0u32;
    let mut report_count = 0u32;
    let mut depth = 0usize;

    for item in items(bytes) {
        let item = item?;
        match (item.kind, item.tag) {
            (ItemKind::Global, TAG_REPORT_ID) => report_id = item.data as u8,
            (ItemKind::Global, TAG_REPORT_SIZE) => report_size = item.data,
            (ItemKind::Global, TAG_REPORT_COUNT) => report_count = item.data,
            (ItemKind::Main, TAG_COLLECTION) => depth += 1,
            (ItemKind::Main, TAG_END_COLLECTION) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(DescriptorError::UnmatchedEnd { offset: item.offset })?;
            }
            (ItemKind::Main, tag @ (TAG_INPUT | TAG_OUTPUT)) => {
                let layout = match layouts.iter_mut().position(|l| l.id == report_id) {
                    Some(i) => &mut layouts[i],
                    None => {
                        layouts.push(ReportLayout {
                            id: report_id,
                            input_bits: 0,
                            output_bits: 0,
                        });
                        let last = layouts.len() - 1;
                        &mut layouts[last]
                    }
                };
                let bits = report_size * report_count;
                if tag == TAG_INPUT {
                    layout.input_bits += bits;
                } else {
                    layout.output_bits += bits;
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(DescriptorError::UnclosedCollection { open: depth });
    }
    Ok(layouts)
}

/// Report IDs declared by `bytes`, in order of appearance.
pub fn report_ids(bytes: &[u8]) -> Result<Vec<u8>, DescriptorError> {
    let mut ids = Vec::new();
    for item in items(bytes) {
        let item = item?;
        if item.kind == ItemKind::Global && item.tag == TAG_REPORT_ID {
            ids.push(item.data as u8);
        }
    }
    Ok(ids)
}
