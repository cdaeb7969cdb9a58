use rsa::RsaPublicKey;
use rsa::traits::PublicKeyParts;

fn write_ssh_string(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buf.extend_from_slice(data);
}

/// Encode a big-endian magnitude as an SSH `mpint` (RFC 4251 §5): leading
/// zero bytes stripped, then a single `0x00` byte re-added if the high bit
/// of the first remaining byte is set, so the value reads as positive.
fn write_ssh_mpint(buf: &mut Vec<u8>, magnitude_be: &[u8]) {
    let mut bytes = magnitude_be;
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes = &bytes[1..];
    }

    if !bytes.is_empty() && bytes[0] & 0x80 != 0 {
        let mut padded = Vec::with_capacity(bytes.len() + 1);
        padded.push(0);
        padded.extend_from_slice(bytes);
        write_ssh_string(buf, &padded);
    } else {
        write_ssh_string(buf, bytes);
    }
}

/// Derive the `ssh-rsa` wire encoding (RFC 4253 §6.6) of an RSA public key:
/// `string "ssh-rsa" || mpint e || mpint n`.
pub fn rsa_public_key_wire(public_key: &RsaPublicKey) -> Vec<u8> {
    let mut buf = Vec::new();
    write_ssh_string(&mut buf, b"ssh-rsa");
    write_ssh_mpint(&mut buf, &public_key.e().to_bytes_be());
    write_ssh_mpint(&mut buf, &public_key.n().to_bytes_be());
    buf
}
