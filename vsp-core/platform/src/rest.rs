//! vSphere REST 客户端实现
//!
//! 基于 vCenter Automation 风格的 REST 接口实现 [`VSphere`] 契约:
//! 会话登录换取令牌, 之后的请求通过 `vmware-api-session-id` 头认证。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::VSphere;
use crate::error::{Result, VSphereError};
use crate::models::{CloneOptions, CustomizationSpec, SnapshotHandle, VmHandle};

/// REST 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 连接超时（秒）
    pub connect_timeout: u64,

    /// 请求超时（秒）
    pub request_timeout: u64,

    /// 是否验证 SSL 证书
    pub verify_ssl: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
            request_timeout: 60,
            verify_ssl: true,
        }
    }
}

/// vSphere REST 客户端
pub struct VSphereClient {
    /// API 基础 URL
    base_url: String,

    /// HTTP 客户端
    http_client: Client,

    /// 会话令牌
    session_id: Arc<RwLock<Option<String>>>,
}

/// 克隆/部署请求中的放置参数
#[derive(Debug, Serialize)]
struct PlacementBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    datastore: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource_pool: Option<String>,
}

impl PlacementBody {
    fn from_options(options: &CloneOptions) -> Self {
        Self {
            cluster: non_empty(&options.cluster),
            datastore: non_empty(&options.datastore),
            folder: non_empty(&options.folder),
            resource_pool: non_empty(&options.resource_pool),
        }
    }
}

/// 克隆请求体
#[derive(Debug, Serialize)]
struct CloneBody {
    source: String,
    name: String,
    placement: PlacementBody,
    power_on: bool,
    linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    customization_spec: Option<String>,
}

/// 模板部署请求体
#[derive(Debug, Serialize)]
struct DeployBody {
    template: String,
    name: String,
    placement: PlacementBody,
    power_on: bool,
    linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    customization_spec: Option<String>,
}

/// 备注更新请求体
#[derive(Debug, Serialize)]
struct AnnotationBody {
    annotation: String,
}

/// guest-info 属性项
#[derive(Debug, Serialize)]
struct GuestVariableBody {
    name: String,
    value: String,
}

/// guest 身份信息响应
#[derive(Debug, Deserialize)]
struct GuestIdentity {
    #[serde(default)]
    ip_address: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl VSphereClient {
    /// 创建新的 REST 客户端
    pub fn new(base_url: &str, config: ClientConfig) -> Result<Self> {
        url::Url::parse(base_url)
            .map_err(|e| VSphereError::ConfigError(format!("非法的基础 URL {}: {}", base_url, e)))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| VSphereError::HttpError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            session_id: Arc::new(RwLock::new(None)),
        })
    }

    /// 会话登录
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        info!("vSphere 客户端登录: {}", username);

        let login_url = format!("{}/api/session", self.base_url);
        let response = self
            .http_client
            .post(&login_url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| VSphereError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误响应".to_string());
            return Err(VSphereError::AuthError(format!(
                "vSphere 登录失败 [{}]: {}",
                status.as_u16(),
                error_text
            )));
        }

        // 会话接口直接返回令牌字符串
        let token: String = response
            .json()
            .await
            .map_err(|e| VSphereError::ParseError(e.to_string()))?;

        *self.session_id.write().await = Some(token);

        info!("vSphere 客户端登录成功");
        Ok(())
    }

    /// 注销会话
    pub async fn logout(&self) -> Result<()> {
        info!("vSphere 客户端登出");
        *self.session_id.write().await = None;
        Ok(())
    }

    /// 发送认证请求并反序列化响应
    async fn request<T: Serialize, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<T>,
    ) -> Result<R> {
        let response = self.send(method, path, body, &[]).await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误响应".to_string());
            warn!("API 请求失败: {} - {}", status, error_text);
            return Err(VSphereError::ApiError(status.as_u16(), error_text));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| VSphereError::ParseError(e.to_string()))
    }

    /// 发送认证请求, 不解析响应体
    async fn request_unit<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<T>,
    ) -> Result<()> {
        let response = self.send(method, path, body, &[]).await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误响应".to_string());
            warn!("API 请求失败: {} - {}", status, error_text);
            return Err(VSphereError::ApiError(status.as_u16(), error_text));
        }

        Ok(())
    }

    /// 发送认证请求, 将"资源尚不可用"(404/503) 映射为 `None`
    async fn request_optional<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<Option<R>> {
        let response = self.send::<()>(method, path, None, &[]).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误响应".to_string());
            warn!("API 请求失败: {} - {}", status, error_text);
            return Err(VSphereError::ApiError(status.as_u16(), error_text));
        }

        response
            .json::<R>()
            .await
            .map(Some)
            .map_err(|e| VSphereError::ParseError(e.to_string()))
    }

    async fn send<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<T>,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("vSphere API 请求: {} {}", method, url);

        let session = self.session_id.read().await;
        let session_str = session
            .as_ref()
            .ok_or_else(|| VSphereError::AuthError("未认证，请先登录".to_string()))?;

        let mut request = self
            .http_client
            .request(method, &url)
            .header("vmware-api-session-id", session_str);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        request
            .send()
            .await
            .map_err(|e| VSphereError::HttpError(e.to_string()))
    }

    /// 查询虚拟机列表, 可按名称过滤
    async fn list_vms(&self, name: Option<&str>) -> Result<Vec<VmHandle>> {
        let query: Vec<(&str, &str)> = match name {
            Some(n) => vec![("names", n)],
            None => vec![],
        };
        let response = self.send::<()>(Method::GET, "/api/vcenter/vm", None, &query).await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误响应".to_string());
            return Err(VSphereError::ApiError(status.as_u16(), error_text));
        }

        response
            .json::<Vec<VmHandle>>()
            .await
            .map_err(|e| VSphereError::ParseError(e.to_string()))
    }

    /// 解析虚拟机名称为平台标识
    async fn resolve_vm_id(&self, name: &str) -> Result<String> {
        match self.list_vms(Some(name)).await?.into_iter().next() {
            Some(handle) => Ok(handle.id),
            None => Err(VSphereError::NotFound(format!("虚拟机 {}", name))),
        }
    }
}

#[async_trait]
impl VSphere for VSphereClient {
    async fn find_vm(&self, name: &str) -> Result<Option<VmHandle>> {
        debug!("查找虚拟机: {}", name);
        Ok(self.list_vms(Some(name)).await?.into_iter().next())
    }

    async fn clone_vm(&self, source: &str, target: &str, options: &CloneOptions) -> Result<()> {
        info!("克隆虚拟机: {} -> {}", source, target);

        let body = CloneBody {
            source: self.resolve_vm_id(source).await?,
            name: target.to_string(),
            placement: PlacementBody::from_options(options),
            power_on: options.power_on,
            linked: options.linked_clone,
            customization_spec: non_empty(&options.customization_spec),
        };

        let _vm_id: String = self
            .request(Method::POST, "/api/vcenter/vm?action=clone", Some(body))
            .await?;
        Ok(())
    }

    async fn deploy_vm(&self, template: &str, target: &str, options: &CloneOptions) -> Result<()> {
        info!("从模板部署虚拟机: {} -> {}", template, target);

        let body = DeployBody {
            template: self.resolve_vm_id(template).await?,
            name: target.to_string(),
            placement: PlacementBody::from_options(options),
            power_on: options.power_on,
            linked: options.linked_clone,
            customization_spec: non_empty(&options.customization_spec),
        };

        let _vm_id: String = self
            .request(
                Method::POST,
                "/api/vcenter/vm-template?action=deploy",
                Some(body),
            )
            .await?;
        Ok(())
    }

    async fn set_annotation(&self, vm: &str, annotation: &str) -> Result<()> {
        info!("更新虚拟机备注: {}", vm);

        let vm_id = self.resolve_vm_id(vm).await?;
        let body = AnnotationBody {
            annotation: annotation.to_string(),
        };
        self.request_unit(Method::PATCH, &format!("/api/vcenter/vm/{}", vm_id), Some(body))
            .await
    }

    async fn inject_guest_properties(
        &self,
        vm: &str,
        properties: &[(String, String)],
    ) -> Result<()> {
        info!("注入 guest-info 属性: {} ({} 项)", vm, properties.len());

        let vm_id = self.resolve_vm_id(vm).await?;
        let body: Vec<GuestVariableBody> = properties
            .iter()
            .map(|(name, value)| GuestVariableBody {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        self.request_unit(
            Method::PUT,
            &format!("/api/vcenter/vm/{}/guest/variables", vm_id),
            Some(body),
        )
        .await
    }

    async fn guest_ip(&self, vm: &VmHandle) -> Result<Option<String>> {
        let identity: Option<GuestIdentity> = self
            .request_optional(
                Method::GET,
                &format!("/api/vcenter/vm/{}/guest/identity", vm.id),
            )
            .await?;
        Ok(identity.and_then(|i| i.ip_address))
    }

    async fn current_snapshot(&self, vm: &VmHandle) -> Result<Option<SnapshotHandle>> {
        self.request_optional(
            Method::GET,
            &format!("/api/vcenter/vm/{}/snapshot/current", vm.id),
        )
        .await
    }

    async fn find_customization_spec(&self, name: &str) -> Result<Option<CustomizationSpec>> {
        let response = self
            .send::<()>(
                Method::GET,
                "/api/vcenter/guest/customization-specs",
                None,
                &[("names", name)],
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误响应".to_string());
            return Err(VSphereError::ApiError(status.as_u16(), error_text));
        }

        let specs: Vec<CustomizationSpec> = response
            .json()
            .await
            .map_err(|e| VSphereError::ParseError(e.to_string()))?;
        Ok(specs.into_iter().next())
    }
}
