/// Decode bytes stored in the system OEM codepage, the encoding legacy ZIP
/// tools use for entry names on Windows.
///
/// Returns `None` when the bytes are not valid in that codepage. Platforms
/// without an OEM codepage also return `None`; callers fall back to CP437,
/// the ZIP format's default.
#[cfg(windows)]
#[must_use]
pub fn decode_oem(bytes: &[u8]) -> Option<String> {
    use windows_sys::Win32::Globalization::{CP_OEMCP, MB_ERR_INVALID_CHARS, MultiByteToWideChar};

    if bytes.is_empty() {
        return Some(String::new());
    }
    let len = i32::try_from(bytes.len()).ok()?;

    // SAFETY: the input pointer and length describe `bytes`; a null output
    // buffer with zero capacity only queries the required length.
    let needed = unsafe {
        MultiByteToWideChar(
            CP_OEMCP,
            MB_ERR_INVALID_CHARS,
            bytes.as_ptr(),
            len,
            std::ptr::null_mut(),
            0,
        )
    };
    if needed <= 0 {
        log::debug!("OEM codepage rejected {} name bytes", bytes.len());
        return None;
    }

    let mut wide = vec![0_u16; usize::try_from(needed).ok()?];
    // SAFETY: `wide` holds exactly `needed` UTF-16 units as reported above.
    let written = unsafe {
        MultiByteToWideChar(
            CP_OEMCP,
            MB_ERR_INVALID_CHARS,
            bytes.as_ptr(),
            len,
            wide.as_mut_ptr(),
            needed,
        )
    };
    if written <= 0 {
        return None;
    }
    wide.truncate(usize::try_from(written).ok()?);
    String::from_utf16(&wide).ok()
}

#[cfg(not(windows))]
#[must_use]
pub fn decode_oem(_bytes: &[u8]) -> Option<String> {
    None
}
