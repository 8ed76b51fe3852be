/// 密码加密与校验模块
///
/// 使用 bcrypt 算法进行密码加密（行业标准）

use bcrypt::{hash, verify, DEFAULT_COST};
use crate::error::{Result, ServerError};

/// 密码加密成本（默认值12，适合大多数场景）
pub const PASSWORD_COST: u32 = DEFAULT_COST; // 12

/// 密码最小长度
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// 加密密码
///
/// 使用 bcrypt 算法将明文密码加密为哈希值
///
/// # 参数
/// - password: 明文密码
///
/// # 返回
/// - Ok(String): 加密后的密码哈希（60字符）
/// - Err: 加密失败
pub fn hash_password(password: &str) -> Result<String> {
    hash(password, PASSWORD_COST)
        .map_err(|e| ServerError::Internal(format!("密码加密失败: {}", e)))
}

/// 验证密码
///
/// 比较明文密码和存储的哈希值是否匹配
///
/// # 参数
/// - password: 明文密码
/// - hash: 存储的密码哈希
///
/// # 返回
/// - Ok(true): 密码匹配
/// - Ok(false): 密码不匹配
/// - Err: 验证过程出错
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    verify(password, hash)
        .map_err(|e| ServerError::Internal(format!("密码验证失败: {}", e)))
}

/// 校验密码强度
///
/// 注册时的最低要求：长度至少 8 字符，且同时包含大写字母、小写字母和数字。
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < PASSWORD_MIN_LENGTH {
        return Err(ServerError::Validation(format!(
            "密码长度至少 {} 字符",
            PASSWORD_MIN_LENGTH
        )));
    }

    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_uppercase || !has_lowercase || !has_digit {
        return Err(ServerError::Validation(
            "密码必须同时包含大写字母、小写字母和数字".to_string(),
        ));
    }

    Ok(())
}

/// 校验邮箱格式
///
/// 只做结构检查：本地部分和域名部分非空，域名包含点号。
pub fn validate_email(email: &str) -> Result<()> {
    let invalid = || ServerError::Validation(format!("邮箱格式无效: {}", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    if local.is_empty() || domain.is_empty() {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    if email.contains(char::is_whitespace) {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "Secret123";
        let hash = hash_password(password).unwrap();

        // bcrypt 哈希总是 60 字符
        assert_eq!(hash.len(), 60);
        // bcrypt 哈希以 $2b$ 开头
        assert!(hash.starts_with("$2b$"));
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "Secret123";
        let hash = hash_password(password).unwrap();

        // 正确的密码应该验证成功
        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_wrong() {
        let password = "Secret123";
        let hash = hash_password(password).unwrap();

        // 错误的密码应该验证失败
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_hash() {
        let password = "Secret123";
        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        // 相同密码的哈希值应该不同（因为 salt 不同）
        assert_ne!(hash1, hash2);

        // 但都应该能验证成功
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("Secret123").is_ok());

        // 太短
        assert!(validate_password_strength("Ab1").is_err());
        // 缺少大写字母
        assert!(validate_password_strength("secret123").is_err());
        // 缺少小写字母
        assert!(validate_password_strength("SECRET123").is_err());
        // 缺少数字
        assert!(validate_password_strength("SecretPass").is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());

        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@").is_err());
        assert!(validate_email("alice@nodot").is_err());
        assert!(validate_email("alice@.com").is_err());
        assert!(validate_email("ali ce@example.com").is_err());
    }
}
