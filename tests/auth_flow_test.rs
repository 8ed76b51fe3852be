//! AuthService 端到端测试（进程内存储后端）

use promboard::auth::{AuthService, JwtService, MemoryUserStore, RefreshTokenStore};
use promboard::error::ServerError;
use promboard::infra::MemoryKvStore;
use std::sync::Arc;

const THIRTY_DAYS_SECS: u64 = 30 * 24 * 3600;

fn new_auth_service() -> AuthService {
    let users = Arc::new(MemoryUserStore::new());
    let jwt_service = Arc::new(JwtService::new(
        "test-secret-key-at-least-32-chars",
        "promboard".to_string(),
        900,
    ));
    let kv = Arc::new(MemoryKvStore::new());
    let refresh_tokens = Arc::new(RefreshTokenStore::new(kv, THIRTY_DAYS_SECS));

    AuthService::new(users, jwt_service, refresh_tokens)
}

#[tokio::test]
async fn test_register_me_refresh_replay_flow() {
    let service = new_auth_service();

    // 注册拿到令牌对
    let pair = service
        .register("alice@example.com", "Secret123", "Alice")
        .await
        .unwrap();
    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, 900);
    assert!(!pair.access_token.is_empty());
    assert!(pair.refresh_token.len() >= 40);

    // Me 返回注册时的身份
    let profile = service.me(&pair.access_token).await.unwrap();
    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.name, "Alice");

    // 刷新得到新令牌对，刷新令牌已轮换
    let new_pair = service.refresh(&pair.refresh_token).await.unwrap();
    assert_ne!(new_pair.refresh_token, pair.refresh_token);
    assert_eq!(new_pair.expires_in, 900);

    // 新访问令牌同样可用
    let profile = service.me(&new_pair.access_token).await.unwrap();
    assert_eq!(profile.email, "alice@example.com");

    // 用原始刷新令牌重放必须失败
    let replay = service.refresh(&pair.refresh_token).await;
    assert!(matches!(replay, Err(ServerError::InvalidRefreshToken)));
}

#[tokio::test]
async fn test_register_validation() {
    let service = new_auth_service();

    // 非法邮箱
    let result = service.register("not-an-email", "Secret123", "Alice").await;
    assert!(matches!(result, Err(ServerError::Validation(_))));

    // 弱密码（缺少大写字母）
    let result = service
        .register("alice@example.com", "secret123", "Alice")
        .await;
    assert!(matches!(result, Err(ServerError::Validation(_))));

    // 空显示名
    let result = service
        .register("alice@example.com", "Secret123", "  ")
        .await;
    assert!(matches!(result, Err(ServerError::Validation(_))));
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let service = new_auth_service();

    service
        .register("alice@example.com", "Secret123", "Alice")
        .await
        .unwrap();

    let result = service
        .register("alice@example.com", "Other456x", "Alice 2")
        .await;
    assert!(matches!(result, Err(ServerError::DuplicateEntry(_))));
}

#[tokio::test]
async fn test_login_failures_undifferentiated() {
    let service = new_auth_service();

    service
        .register("alice@example.com", "Secret123", "Alice")
        .await
        .unwrap();

    // 密码错误和用户不存在返回同一种错误
    let wrong_password = service.login("alice@example.com", "WrongPass1").await;
    let unknown_user = service.login("bob@example.com", "Secret123").await;

    assert!(matches!(wrong_password, Err(ServerError::Unauthorized(_))));
    assert!(matches!(unknown_user, Err(ServerError::Unauthorized(_))));

    // 正确凭证登录成功
    let pair = service.login("alice@example.com", "Secret123").await.unwrap();
    assert_eq!(pair.expires_in, 900);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let service = new_auth_service();

    let pair = service
        .register("alice@example.com", "Secret123", "Alice")
        .await
        .unwrap();

    // 登出后刷新令牌失效
    service.logout(&pair.refresh_token).await.unwrap();
    let result = service.refresh(&pair.refresh_token).await;
    assert!(matches!(result, Err(ServerError::InvalidRefreshToken)));

    // 重复登出依然成功
    service.logout(&pair.refresh_token).await.unwrap();
    service.logout("never-existed-token").await.unwrap();
}

#[tokio::test]
async fn test_logout_all_revokes_every_session() {
    let service = new_auth_service();

    // 同一用户的两个会话
    let session1 = service
        .register("alice@example.com", "Secret123", "Alice")
        .await
        .unwrap();
    let session2 = service.login("alice@example.com", "Secret123").await.unwrap();

    // 其他用户的会话
    let other = service
        .register("bob@example.com", "Secret456", "Bob")
        .await
        .unwrap();

    let profile = service.me(&session1.access_token).await.unwrap();
    service.logout_all(profile.user_id).await.unwrap();

    // 该用户的所有刷新令牌失效
    assert!(service.refresh(&session1.refresh_token).await.is_err());
    assert!(service.refresh(&session2.refresh_token).await.is_err());

    // 其他用户不受影响
    assert!(service.refresh(&other.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_me_rejects_garbage_token() {
    let service = new_auth_service();

    let result = service.me("garbage.token.value").await;
    assert!(matches!(result, Err(ServerError::InvalidToken)));
}
