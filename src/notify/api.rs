//! 推送渠道请求构造
//!
//! 每个渠道只负责把凭据 + 标题 + 正文变成一个 HTTP 请求,
//! 凭据缺失时返回对应的配置错误,绝不发出半配置的请求。

use reqwest::{Client, Request, Url};

use super::NotifyError;
use crate::config::{NotifyChannel, NotifyCredentials};

/// 所有出站请求携带的来源标识头
pub const SOURCE_HEADER: &str = "x-source";
pub const SOURCE_VALUE: &str = "session-event-monitor";

const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";
const SERVERCAT_BASE: &str = "https://sc.ftqq.com";
const BARK_GROUP: &str = "session-event-monitor";
const BARK_ICON: &str = "https://raw.githubusercontent.com/session-event-monitor/assets/main/icon.png";
const BARK_CRITICAL_VOLUME: &str = "5";

/// 按所选渠道构造请求
pub fn build_request(
    client: &Client,
    channel: NotifyChannel,
    credentials: &NotifyCredentials,
    title: &str,
    message: &str,
) -> Result<Request, NotifyError> {
    match channel {
        NotifyChannel::None => Err(NotifyError::NoChannel),
        NotifyChannel::Pushover => build_pushover(client, credentials, title, message),
        NotifyChannel::ServerCat => build_servercat(client, credentials, title, message),
        NotifyChannel::Bark => build_bark(client, credentials, title, message),
    }
}

fn build_pushover(
    client: &Client,
    credentials: &NotifyCredentials,
    title: &str,
    message: &str,
) -> Result<Request, NotifyError> {
    let pushover = &credentials.pushover;
    if pushover.token.is_empty() || pushover.user.is_empty() {
        return Err(NotifyError::PushoverConfig);
    }

    let mut body = serde_json::json!({
        "token": pushover.token,
        "user": pushover.user,
        "title": title,
        "message": message,
    });
    if !pushover.device.is_empty() {
        body["device"] = serde_json::json!(pushover.device);
    }

    let request = client
        .post(PUSHOVER_ENDPOINT)
        .header(SOURCE_HEADER, SOURCE_VALUE)
        .json(&body)
        .build()?;
    Ok(request)
}

fn build_servercat(
    client: &Client,
    credentials: &NotifyCredentials,
    title: &str,
    message: &str,
) -> Result<Request, NotifyError> {
    let key = &credentials.servercat.key;
    if key.is_empty() {
        return Err(NotifyError::ServercatConfig);
    }

    let request = client
        .get(format!("{}/{}.send", SERVERCAT_BASE, key))
        .query(&[("text", title), ("desp", message)])
        .header(SOURCE_HEADER, SOURCE_VALUE)
        .build()?;
    Ok(request)
}

fn build_bark(
    client: &Client,
    credentials: &NotifyCredentials,
    title: &str,
    message: &str,
) -> Result<Request, NotifyError> {
    let bark = &credentials.bark;
    if bark.server.is_empty() || bark.device.is_empty() {
        return Err(NotifyError::BarkConfig);
    }

    let mut url = Url::parse(&format!("https://{}", bark.server))
        .map_err(|_| NotifyError::BarkConfig)?;
    url.path_segments_mut()
        .map_err(|_| NotifyError::BarkConfig)?
        .extend([bark.device.as_str(), title, message]);

    let mut builder = client
        .get(url)
        .query(&[("group", BARK_GROUP), ("icon", BARK_ICON)]);
    if bark.critical {
        builder = builder.query(&[("level", "critical"), ("volume", BARK_CRITICAL_VOLUME)]);
    }

    let request = builder.header(SOURCE_HEADER, SOURCE_VALUE).build()?;
    Ok(request)
}
