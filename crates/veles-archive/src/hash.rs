//! Archive name hashing.
//!
//! BSA directories and files are keyed by a 64-bit hash of the normalized
//! path, so entries can be looked up even in archives written without a name
//! table. The packing is: last byte, second-to-last byte, length, first byte,
//! then a 32-bit multiplicative checksum over the middle of the name, with
//! the file extension folded in for file hashes.

/// Well-known extensions that perturb the hash bytes.
const EXTENSION_LUT: [u32; 6] = [
    make_four(b""),
    make_four(b".nif"),
    make_four(b".kf"),
    make_four(b".dds"),
    make_four(b".wav"),
    make_four(b".adp"),
];

const fn make_four(bytes: &[u8]) -> u32 {
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() && i < 4 {
        value |= (bytes[i] as u32) << (i * 8);
        i += 1;
    }
    value
}

fn checksum(bytes: &[u8]) -> u32 {
    let mut crc: u32 = 0;
    for &b in bytes {
        crc = u32::from(b).wrapping_add(crc.wrapping_mul(0x1003F));
    }
    crc
}

fn normalize(path: &[u8]) -> Vec<u8> {
    path.iter()
        .map(|&b| match b {
            b'/' => b'\\',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

fn pack(last: u8, last2: u8, length: u8, first: u8, crc: u32) -> u64 {
    u64::from(last)
        | u64::from(last2) << 8
        | u64::from(length) << 16
        | u64::from(first) << 24
        | u64::from(crc) << 32
}

fn hash_normalized(path: &[u8]) -> u64 {
    let len = path.len();
    let mut last = 0u8;
    let mut last2 = 0u8;
    let mut first = 0u8;
    if len >= 3 {
        last2 = path[len - 2];
    }
    if len >= 1 {
        last = path[len - 1];
        first = path[0];
    }
    // length truncates to u8 on purpose, matching the engine
    let length = len as u8;
    let crc = if length > 3 {
        checksum(&path[1..len - 2])
    } else {
        0
    };
    pack(last, last2, length, first, crc)
}

/// Hash a directory path.
pub fn hash_directory(path: &str) -> u64 {
    hash_directory_bytes(path.as_bytes())
}

/// Hash a directory path given as raw bytes.
pub fn hash_directory_bytes(path: &[u8]) -> u64 {
    hash_normalized(&normalize(path))
}

/// Hash a file name. Parent directories are stripped; the extension is folded
/// into the checksum and, for well-known extensions, into the packed bytes.
pub fn hash_file(path: &str) -> u64 {
    hash_file_bytes(path.as_bytes())
}

/// Hash a file name given as raw bytes.
pub fn hash_file_bytes(path: &[u8]) -> u64 {
    let mut path = normalize(path);
    if let Some(pos) = path.iter().rposition(|&b| b == b'\\') {
        path.drain(..=pos);
    }

    let (stem, extension) = match path.iter().rposition(|&b| b == b'.') {
        Some(split_at) => (&path[..split_at], &path[split_at..]),
        None => (&path[..], b"".as_slice()),
    };

    if stem.is_empty() || stem.len() >= 260 || extension.len() >= 16 {
        return 0;
    }

    let h = hash_normalized(stem);
    let mut last = h as u8;
    let mut last2 = (h >> 8) as u8;
    let length = (h >> 16) as u8;
    let mut first = (h >> 24) as u8;
    let crc = ((h >> 32) as u32).wrapping_add(checksum(extension));

    let cc = make_four(extension);
    if let Some(i) = EXTENSION_LUT.iter().position(|&x| x == cc) {
        let i = i as u8;
        first = (u32::from(first).wrapping_add(32 * u32::from(i & 0xFC))) as u8;
        last = (u32::from(last).wrapping_add(u32::from(i & 0xFE) << 6)) as u8;
        last2 = (u32::from(last2).wrapping_add(u32::from(i.wrapping_shl(7)))) as u8;
    }

    pack(last, last2, length, first, crc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_directory_hashes() {
        assert_eq!(
            hash_directory("textures/armor/amuletsandrings/elder council"),
            0x04BC422C742C696C
        );
        assert_eq!(
            hash_directory("sound/voice/skyrim.esm/maleuniquedbguardian"),
            0x594085AC732B616E
        );
        assert_eq!(hash_directory("textures/architecture/windhelm"), 0xC1D97EBE741E6C6D);
    }

    #[test]
    fn known_file_hashes() {
        assert_eq!(hash_file("darkbrotherhood__0007469a_1.fuz"), 0x011F11B0641B5F31);
        assert_eq!(hash_file("elder_council_amulet_n.dds"), 0xDC531E2F6516DFEE);
        assert_eq!(
            hash_file("testtoddquest_testtoddhappy_00027fa2_1.mp3"),
            0xDE0301EE74265F31
        );
    }

    #[test]
    fn separators_and_case_are_normalized() {
        assert_eq!(
            hash_directory("Textures\\Architecture\\Windhelm"),
            hash_directory("textures/architecture/windhelm")
        );
    }

    #[test]
    fn parent_directories_do_not_affect_file_hashes() {
        assert_eq!(hash_file("users/john/test.txt"), hash_file("test.txt"));
    }

    #[test]
    fn degenerate_names_hash_to_zero() {
        assert_eq!(hash_file(".gitignore"), 0);
        let long = "a".repeat(260) + ".nif";
        assert_eq!(hash_file(&long), 0);
    }
}
