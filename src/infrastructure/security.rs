use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use base64ct::{Base64, Encoding};
use rand_core::OsRng;
use thiserror::Error;

// Argon2 parameters for 50-150ms target latency
const ARGON2_M_COST: u32 = 19456; // 19 MB
const ARGON2_T_COST: u32 = 2; // 2 iterations
const ARGON2_P_COST: u32 = 1; // 1 parallelism

fn argon2() -> Result<Argon2<'static>, argon2::password_hash::Error> {
    let params = argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(argon2::password_hash::Error::from)?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2()?.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match argon2()?.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Credentials carried by an `Authorization: Basic ...` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub name: String,
    pub pass: String,
}

// Hand-written so the password can never end up in a log line.
impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("name", &self.name)
            .field("pass", &"<redacted>")
            .finish()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BasicAuthError {
    #[error("authorization scheme is not Basic")]
    WrongScheme,
    #[error("credentials are not valid base64")]
    Encoding,
    #[error("credentials are not valid UTF-8")]
    Utf8,
    #[error("credentials are missing the ':' separator")]
    MissingSeparator,
}

/// Parses the value of an `Authorization` header.
///
/// The scheme is matched case-insensitively and the user part ends at the
/// first `:`, so passwords may themselves contain colons.
pub fn parse_basic_auth(header: &str) -> Result<BasicCredentials, BasicAuthError> {
    let (scheme, encoded) = header
        .trim()
        .split_once(' ')
        .ok_or(BasicAuthError::WrongScheme)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(BasicAuthError::WrongScheme);
    }

    let decoded = Base64::decode_vec(encoded.trim()).map_err(|_| BasicAuthError::Encoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| BasicAuthError::Utf8)?;
    let (name, pass) = decoded
        .split_once(':')
        .ok_or(BasicAuthError::MissingSeparator)?;

    Ok(BasicCredentials {
        name: name.to_string(),
        pass: pass.to_string(),
    })
}

/// Builds an `Authorization` header value; the inverse of [`parse_basic_auth`].
pub fn basic_auth_header(name: &str, pass: &str) -> String {
    format!("Basic {}", Base64::encode_string(format!("{name}:{pass}").as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_generates_valid_hash() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(!hash.is_empty());
        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_password_same_password_produces_different_hashes() {
        let password = "same_password";

        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        // Due to random salt, same password should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct_password_returns_true() {
        let password = "correct_password";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect_password_returns_false() {
        let hash = hash_password("correct_password").unwrap();

        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = verify_password("test_password", "not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_password_with_unicode() {
        let password = "пароль123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_parse_basic_auth_reads_name_and_pass() {
        // "joe@smith.com:joepassword"
        let creds = parse_basic_auth("Basic am9lQHNtaXRoLmNvbTpqb2VwYXNzd29yZA==").unwrap();
        assert_eq!(creds.name, "joe@smith.com");
        assert_eq!(creds.pass, "joepassword");
    }

    #[test]
    fn test_parse_basic_auth_scheme_is_case_insensitive() {
        let header = basic_auth_header("a@b.com", "pw").replacen("Basic", "bAsIc", 1);
        assert_eq!(parse_basic_auth(&header).unwrap().name, "a@b.com");
    }

    #[test]
    fn test_parse_basic_auth_keeps_colons_in_password() {
        let header = basic_auth_header("a@b.com", "p:a:ss");
        let creds = parse_basic_auth(&header).unwrap();
        assert_eq!(creds.name, "a@b.com");
        assert_eq!(creds.pass, "p:a:ss");
    }

    #[test]
    fn test_parse_basic_auth_rejects_bearer() {
        assert_eq!(
            parse_basic_auth("Bearer abc.def.ghi"),
            Err(BasicAuthError::WrongScheme)
        );
        assert_eq!(parse_basic_auth("Basic"), Err(BasicAuthError::WrongScheme));
    }

    #[test]
    fn test_parse_basic_auth_rejects_bad_payloads() {
        assert_eq!(parse_basic_auth("Basic !!!"), Err(BasicAuthError::Encoding));
        // "no-separator"
        assert_eq!(
            parse_basic_auth("Basic bm8tc2VwYXJhdG9y"),
            Err(BasicAuthError::MissingSeparator)
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = BasicCredentials {
            name: "joe@smith.com".to_string(),
            pass: "hunter2".to_string(),
        };
        let printed = format!("{:?}", creds);
        assert!(printed.contains("joe@smith.com"));
        assert!(!printed.contains("hunter2"));
    }
}
