//! The hash primitive shared by the challenge signature and the password proof.
//!
//! GnuDIP clients compute their proof with MD5, so the algorithm is fixed by the wire protocol.

/// Lowercase hex MD5 digest of `data`.
pub fn digest(data: impl AsRef<[u8]>) -> String {
    format!("{:x}", md5::compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_known_values() {
        assert_eq!(digest(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digest("hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(digest(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }
}
