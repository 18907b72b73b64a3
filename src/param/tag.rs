// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use crate::macros::u32_enum;

pub const TAG_TYPE_MASK: u32 = 0xF << 28;
pub const TAG_TYPE_UINT: u32 = 2 << 28;
pub const TAG_TYPE_BOOL: u32 = 4 << 28;
pub const TAG_TYPE_BYTES: u32 = 5 << 28;

u32_enum! {
    pub enum UintTag {
        Algorithm = TAG_TYPE_UINT | 1 => "ALGORITHM",
        Purpose = TAG_TYPE_UINT | 2 => "PURPOSE",
        KeySize = TAG_TYPE_UINT | 3 => "KEY_SIZE",
        Digest = TAG_TYPE_UINT | 4 => "DIGEST",
        Padding = TAG_TYPE_UINT | 5 => "PADDING",
        BlockMode = TAG_TYPE_UINT | 6 => "BLOCK_MODE",
        KeyType = TAG_TYPE_UINT | 7 => "KEY_TYPE",
        KeyGenerateType = TAG_TYPE_UINT | 15 => "KEY_GENERATE_TYPE",
        KeyStorageFlag = TAG_TYPE_UINT | 1002 => "KEY_STORAGE_FLAG",
        KeyRole = TAG_TYPE_UINT | 1006 => "KEY_ROLE",
        KeyFlag = TAG_TYPE_UINT | 1007 => "KEY_FLAG",
    }
}

u32_enum! {
    pub enum BoolTag {
        IsKeyAlias = TAG_TYPE_BOOL | 1001 => "IS_KEY_ALIAS",
        IsAllowedWrap = TAG_TYPE_BOOL | 1003 => "IS_ALLOWED_WRAP",
    }
}

u32_enum! {
    pub enum BytesTag {
        AssociatedData = TAG_TYPE_BYTES | 8 => "ASSOCIATED_DATA",
        Nonce = TAG_TYPE_BYTES | 9 => "NONCE",
        Iv = TAG_TYPE_BYTES | 10 => "IV",
        KeyAlias = TAG_TYPE_BYTES | 23 => "KEY_ALIAS",
        KeyAuthId = TAG_TYPE_BYTES | 1005 => "KEY_AUTH_ID",
        SymmetricKeyData = TAG_TYPE_BYTES | 20001 => "SYMMETRIC_KEY_DATA",
        AsymmetricPublicKeyData = TAG_TYPE_BYTES | 20002 => "ASYMMETRIC_PUBLIC_KEY_DATA",
        AsymmetricPrivateKeyData = TAG_TYPE_BYTES | 20003 => "ASYMMETRIC_PRIVATE_KEY_DATA",
    }
}

/// A tag from any of the three value families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Uint(UintTag),
    Bool(BoolTag),
    Bytes(BytesTag),
}

impl Tag {
    pub fn value(self) -> u32 {
        match self {
            Tag::Uint(tag) => tag.value(),
            Tag::Bool(tag) => tag.value(),
            Tag::Bytes(tag) => tag.value(),
        }
    }
}

impl TryFrom<u32> for Tag {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value & TAG_TYPE_MASK {
            TAG_TYPE_UINT => UintTag::try_from(value).map(Tag::Uint),
            TAG_TYPE_BOOL => BoolTag::try_from(value).map(Tag::Bool),
            TAG_TYPE_BYTES => BytesTag::try_from(value).map(Tag::Bytes),
            _ => Err(value),
        }
    }
}

impl From<UintTag> for Tag {
    fn from(tag: UintTag) -> Self {
        Tag::Uint(tag)
    }
}

impl From<BoolTag> for Tag {
    fn from(tag: BoolTag) -> Self {
        Tag::Bool(tag)
    }
}

impl From<BytesTag> for Tag {
    fn from(tag: BytesTag) -> Self {
        Tag::Bytes(tag)
    }
}

u32_enum! {
    pub enum Algorithm {
        Rsa = 1 => "RSA",
        Ecc = 2 => "ECC",
        Dsa = 3 => "DSA",
        Aes = 20 => "AES",
        Hmac = 50 => "HMAC",
    }
}

u32_enum! {
    pub enum Digest {
        None = 0 => "NONE",
        Md5 = 1 => "MD5",
        Sha1 = 10 => "SHA1",
        Sha224 = 11 => "SHA224",
        Sha256 = 12 => "SHA256",
        Sha384 = 13 => "SHA384",
        Sha512 = 14 => "SHA512",
    }
}

u32_enum! {
    pub enum Padding {
        None = 0 => "NONE",
        Oaep = 1 => "OAEP",
        Pss = 2 => "PSS",
        Pkcs1V15 = 3 => "PKCS1_V1_5",
        Pkcs5 = 4 => "PKCS5",
        Pkcs7 = 5 => "PKCS7",
    }
}

u32_enum! {
    pub enum StorageFlag {
        Temp = 0 => "TEMP",
        Persistent = 1 => "PERSISTENT",
    }
}

u32_enum! {
    pub enum KeyFlag {
        Generated = 1 => "GENERATED",
        Imported = 2 => "IMPORTED",
    }
}

/// Bit flags carried by the `PURPOSE` tag.
pub mod purpose {
    pub const ENCRYPT: u32 = 1;
    pub const DECRYPT: u32 = 2;
    pub const SIGN: u32 = 4;
    pub const VERIFY: u32 = 8;
    pub const DERIVE: u32 = 16;
    pub const WRAP: u32 = 32;
    pub const UNWRAP: u32 = 64;
    pub const MAC: u32 = 128;
    pub const AGREE: u32 = 256;

    pub const ALL: u32 = ENCRYPT | DECRYPT | SIGN | VERIFY | DERIVE | WRAP | UNWRAP | MAC | AGREE;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_type_bits_select_family() {
        assert_eq!(
            Tag::try_from(TAG_TYPE_UINT | 1),
            Ok(Tag::Uint(UintTag::Algorithm))
        );
        assert_eq!(
            Tag::try_from(TAG_TYPE_BOOL | 1001),
            Ok(Tag::Bool(BoolTag::IsKeyAlias))
        );
        assert_eq!(
            Tag::try_from(TAG_TYPE_BYTES | 20003),
            Ok(Tag::Bytes(BytesTag::AsymmetricPrivateKeyData))
        );
        // right number, wrong family
        assert_eq!(Tag::try_from(TAG_TYPE_BOOL | 1), Err(TAG_TYPE_BOOL | 1));
        assert_eq!(Tag::try_from(3 << 28), Err(3 << 28));
    }

    #[test]
    fn enum_values_match_wire_numbers() {
        assert_eq!(Algorithm::Dsa.value(), 3);
        assert_eq!(Digest::Sha256.value(), 12);
        assert_eq!(Padding::Pkcs1V15.value(), 3);
        assert_eq!(Digest::try_from(2), Err(2));
        assert_eq!(Algorithm::iter().count(), 5);
        assert_eq!(Padding::Pss.to_string(), "PSS");
    }
}
