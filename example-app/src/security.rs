//! 方法级安全示例
//!
//! 三个用户配置共同贡献有序的过滤链槽位，内置的安全自动配置在用户声明了同类组件时退让

use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use di_abstractions::{
    ComponentRegistry, ComponentRegistryExt, ComponentResolverExt, Condition, Configuration, Factory,
};
use infrastructure_common::{DependencyError, HIGHEST_PRECEDENCE};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// 管理端点的路径前缀
pub const ACTUATOR_BASE_PATH: &str = "/actuator";

/// 认证错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("用户不存在: {username}")]
    UserNotFound { username: String },

    #[error("用户名或密码错误")]
    BadCredentials,
}

/// 用户信息
#[derive(Debug, Clone)]
pub struct UserDetails {
    username: String,
    password_hash: String,
    roles: Vec<String>,
}

impl UserDetails {
    /// 使用明文密码创建用户，密码以 argon2 哈希保存
    pub fn with_password<I, S>(username: impl Into<String>, password: &str, roles: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
            .map_err(|e| anyhow!("生成密码盐失败: {}", e))?;
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("密码哈希失败: {}", e))?
            .to_string();

        Ok(Self {
            username: username.into(),
            password_hash,
            roles: roles.into_iter().map(Into::into).collect(),
        })
    }

    /// 用户名
    pub fn username(&self) -> &str {
        &self.username
    }

    /// 角色
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    fn verify(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }
}

/// 已认证的主体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// 用户名
    pub username: String,
    /// 角色
    pub roles: Vec<String>,
}

impl Principal {
    /// 是否具有角色
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// 内存用户存储
#[derive(Debug, Default)]
pub struct InMemoryUserDetailsManager {
    users: BTreeMap<String, UserDetails>,
}

impl InMemoryUserDetailsManager {
    /// 创建用户存储
    pub fn new(users: impl IntoIterator<Item = UserDetails>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
        }
    }

    /// 查找用户
    pub fn load_user(&self, username: &str) -> Option<&UserDetails> {
        self.users.get(username)
    }

    /// 用户数量
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// 是否没有用户
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// 校验凭据并返回主体
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthenticationError> {
        let user = self
            .load_user(username)
            .ok_or_else(|| AuthenticationError::UserNotFound {
                username: username.to_string(),
            })?;
        if !user.verify(password) {
            warn!("用户认证失败: {}", username);
            return Err(AuthenticationError::BadCredentials);
        }
        debug!("用户认证成功: {}", username);
        Ok(Principal {
            username: user.username.clone(),
            roles: user.roles.clone(),
        })
    }
}

/// 请求匹配规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMatcher {
    /// 任意请求
    AnyRequest,
    /// 路径前缀
    PathPrefix(String),
}

impl RequestMatcher {
    /// 是否匹配请求路径
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::AnyRequest => true,
            Self::PathPrefix(prefix) => path == prefix || path.starts_with(&format!("{}/", prefix)),
        }
    }
}

/// 过滤链构建器
///
/// 原型组件，每个过滤链工厂拿到独立的实例
#[derive(Debug, Clone)]
pub struct HttpSecurity {
    users: Arc<InMemoryUserDetailsManager>,
    matcher: RequestMatcher,
    csrf: bool,
    http_basic: bool,
    form_login_page: Option<String>,
    access_denied_page: Option<String>,
}

impl HttpSecurity {
    /// 创建构建器
    pub fn new(users: Arc<InMemoryUserDetailsManager>) -> Self {
        Self {
            users,
            matcher: RequestMatcher::AnyRequest,
            csrf: true,
            http_basic: false,
            form_login_page: None,
            access_denied_page: None,
        }
    }

    /// 关闭 CSRF 保护
    pub fn csrf_disable(mut self) -> Self {
        self.csrf = false;
        self
    }

    /// 限定过滤链作用的请求
    pub fn security_matcher(mut self, matcher: RequestMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// 启用 Basic 认证
    pub fn http_basic(mut self) -> Self {
        self.http_basic = true;
        self
    }

    /// 启用表单登录
    pub fn form_login(mut self, login_page: impl Into<String>) -> Self {
        self.form_login_page = Some(login_page.into());
        self
    }

    /// 拒绝访问时的页面
    pub fn access_denied_page(mut self, page: impl Into<String>) -> Self {
        self.access_denied_page = Some(page.into());
        self
    }

    /// 构建过滤链
    pub fn build(self, name: impl Into<String>) -> SecurityFilterChain {
        SecurityFilterChain {
            name: name.into(),
            users: self.users,
            matcher: self.matcher,
            csrf: self.csrf,
            http_basic: self.http_basic,
            form_login_page: self.form_login_page,
            access_denied_page: self.access_denied_page,
        }
    }
}

/// 安全过滤链
#[derive(Debug)]
pub struct SecurityFilterChain {
    name: String,
    users: Arc<InMemoryUserDetailsManager>,
    matcher: RequestMatcher,
    csrf: bool,
    http_basic: bool,
    form_login_page: Option<String>,
    access_denied_page: Option<String>,
}

impl SecurityFilterChain {
    /// 过滤链名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否处理该请求
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// 是否启用 CSRF 保护
    pub fn csrf_enabled(&self) -> bool {
        self.csrf
    }

    /// 是否启用 Basic 认证
    pub fn http_basic_enabled(&self) -> bool {
        self.http_basic
    }

    /// 表单登录页
    pub fn login_page(&self) -> Option<&str> {
        self.form_login_page.as_deref()
    }

    /// 拒绝访问页
    pub fn access_denied_page(&self) -> Option<&str> {
        self.access_denied_page.as_deref()
    }

    /// 认证请求凭据
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthenticationError> {
        self.users.authenticate(username, password)
    }
}

/// 按顺序选择第一个匹配请求的过滤链
#[derive(Debug)]
pub struct FilterChainProxy {
    chains: Vec<Arc<SecurityFilterChain>>,
}

impl FilterChainProxy {
    /// 创建代理，过滤链须已按排序值排列
    pub fn new(chains: Vec<Arc<SecurityFilterChain>>) -> Self {
        Self { chains }
    }

    /// 处理该请求的过滤链
    pub fn chain_for(&self, path: &str) -> Option<&SecurityFilterChain> {
        self.chains.iter().find(|chain| chain.matches(path)).map(AsRef::as_ref)
    }

    /// 所有过滤链名称
    pub fn chain_names(&self) -> Vec<&str> {
        self.chains.iter().map(|chain| chain.name()).collect()
    }
}

/// 认证配置，最先生效
pub struct AuthenticationSecurity;

impl Configuration for AuthenticationSecurity {
    fn name(&self) -> &str {
        "AuthenticationSecurity"
    }

    fn order(&self) -> i32 {
        HIGHEST_PRECEDENCE
    }

    fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
        registry.register_factory(Factory::new("inMemoryUserDetailsManager", |_| {
            Ok(InMemoryUserDetailsManager::new([
                UserDetails::with_password("admin", "admin", ["ADMIN", "USER", "ACTUATOR"])?,
                UserDetails::with_password("user", "user", ["USER"])?,
            ]))
        }))
    }
}

/// 应用页面的过滤链
pub struct ApplicationSecurity;

impl Configuration for ApplicationSecurity {
    fn name(&self) -> &str {
        "ApplicationSecurity"
    }

    fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
        registry.register_factory(
            Factory::new("configure", |deps| {
                let http = deps.get::<HttpSecurity>()?;
                Ok(HttpSecurity::clone(&http)
                    .csrf_disable()
                    .http_basic()
                    .form_login("/login")
                    .access_denied_page("/access")
                    .build("configure"))
            })
            .depends_on::<HttpSecurity>(),
        )
    }
}

/// 管理端点的过滤链
pub struct ActuatorSecurity;

impl Configuration for ActuatorSecurity {
    fn name(&self) -> &str {
        "ActuatorSecurity"
    }

    fn order(&self) -> i32 {
        1
    }

    fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
        registry.register_factory(
            Factory::new("actuatorSecurity", |deps| {
                let http = deps.get::<HttpSecurity>()?;
                Ok(HttpSecurity::clone(&http)
                    .csrf_disable()
                    .security_matcher(RequestMatcher::PathPrefix(ACTUATOR_BASE_PATH.to_string()))
                    .http_basic()
                    .build("actuatorSecurity"))
            })
            .depends_on::<HttpSecurity>(),
        )
    }
}

/// 内置安全自动配置
///
/// 仅在具备 servlet 能力时生效；用户声明了用户存储或过滤链时对应的默认组件退让
pub struct SecurityAutoConfiguration;

impl Configuration for SecurityAutoConfiguration {
    fn name(&self) -> &str {
        "SecurityAutoConfiguration"
    }

    fn conditions(&self) -> Vec<Condition> {
        vec![Condition::on_capability("servlet")]
    }

    fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
        registry.declare_ordered::<SecurityFilterChain>();

        registry.register_factory(
            Factory::new("generatedUserDetailsManager", |_| {
                let password = uuid::Uuid::new_v4().simple().to_string();
                info!("使用生成的安全密码: {}", password);
                Ok(InMemoryUserDetailsManager::new([UserDetails::with_password(
                    "user",
                    &password,
                    ["USER"],
                )?]))
            })
            .when(Condition::on_missing_component::<InMemoryUserDetailsManager>()),
        )?;

        registry.register_factory(
            Factory::new("httpSecurity", |deps| {
                Ok(HttpSecurity::new(deps.get::<InMemoryUserDetailsManager>()?))
            })
            .depends_on::<InMemoryUserDetailsManager>()
            .prototype(),
        )?;

        registry.register_factory(
            Factory::new("defaultSecurityFilterChain", |deps| {
                let http = deps.get::<HttpSecurity>()?;
                Ok(HttpSecurity::clone(&http).http_basic().build("defaultSecurityFilterChain"))
            })
            .depends_on::<HttpSecurity>()
            .when(Condition::on_missing_component::<SecurityFilterChain>()),
        )?;

        registry.register_factory(
            Factory::new("filterChainProxy", |deps| {
                Ok(FilterChainProxy::new(deps.get_all::<SecurityFilterChain>()?))
            })
            .depends_on_all::<SecurityFilterChain>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Arc<InMemoryUserDetailsManager> {
        Arc::new(InMemoryUserDetailsManager::new([
            UserDetails::with_password("admin", "admin", ["ADMIN", "USER"]).unwrap(),
        ]))
    }

    #[test]
    fn test_authenticate_checks_password() {
        let users = users();
        let principal = users.authenticate("admin", "admin").unwrap();
        assert!(principal.has_role("ADMIN"));
        assert_eq!(users.authenticate("admin", "wrong"), Err(AuthenticationError::BadCredentials));
        assert!(matches!(
            users.authenticate("nobody", "admin"),
            Err(AuthenticationError::UserNotFound { .. })
        ));
    }

    #[test]
    fn test_password_is_not_stored_in_clear() {
        let user = UserDetails::with_password("user", "user", ["USER"]).unwrap();
        assert!(user.password_hash.starts_with("$argon2"));
        assert_ne!(user.password_hash, "user");
    }

    #[test]
    fn test_proxy_picks_first_matching_chain() {
        let users = users();
        let actuator = HttpSecurity::new(users.clone())
            .security_matcher(RequestMatcher::PathPrefix(ACTUATOR_BASE_PATH.to_string()))
            .build("actuator");
        let application = HttpSecurity::new(users).form_login("/login").build("application");
        let proxy = FilterChainProxy::new(vec![Arc::new(actuator), Arc::new(application)]);

        assert_eq!(proxy.chain_for("/actuator/heapdump").unwrap().name(), "actuator");
        assert_eq!(proxy.chain_for("/actuatorx").unwrap().name(), "application");
        assert_eq!(proxy.chain_for("/").unwrap().login_page(), Some("/login"));
    }
}
