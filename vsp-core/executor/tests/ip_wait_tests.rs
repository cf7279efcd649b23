//! IP 就绪等待测试

mod common;

use std::time::Duration;

use common::FakeVSphere;
use vsp_executor::IpWaiter;
use vsp_platform::VSphere;

#[tokio::test(start_paused = true)]
async fn test_ip_available_on_nth_poll() {
    // 前两次探测无地址, 第三次返回
    let vsphere = FakeVSphere::new().ip_after_polls(2, "10.1.2.3");
    let vm = vsphere.find_vm("vm-A").await.unwrap().unwrap();

    let waiter = IpWaiter::with_poll_interval(Duration::from_secs(1));
    let ip = waiter
        .wait_for_ip(&vsphere, &vm, Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(ip.as_deref(), Some("10.1.2.3"));
    assert_eq!(vsphere.ip_polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_returns_none_without_error() {
    // 窗口太短, 覆盖不到出地址的那次探测
    let vsphere = FakeVSphere::new().ip_after_polls(10, "10.1.2.3");
    let vm = vsphere.find_vm("vm-A").await.unwrap().unwrap();

    let waiter = IpWaiter::with_poll_interval(Duration::from_secs(1));
    let ip = waiter
        .wait_for_ip(&vsphere, &vm, Duration::from_secs(3))
        .await
        .unwrap();

    assert!(ip.is_none());
    // 探测发生在 0/1/2/3 秒, 共 4 次
    assert_eq!(vsphere.ip_polls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_ip_needs_single_poll() {
    let vsphere = FakeVSphere::new().ip_after_polls(0, "10.0.0.5");
    let vm = vsphere.find_vm("vm-A").await.unwrap().unwrap();

    let waiter = IpWaiter::with_poll_interval(Duration::from_secs(5));
    let ip = waiter
        .wait_for_ip(&vsphere, &vm, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(ip.as_deref(), Some("10.0.0.5"));
    assert_eq!(vsphere.ip_polls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_probe_error_propagates() {
    let vsphere = FakeVSphere::new().fail_ip_poll();
    let vm = vsphere.find_vm("vm-A").await.unwrap().unwrap();

    let waiter = IpWaiter::with_poll_interval(Duration::from_secs(1));
    let result = waiter
        .wait_for_ip(&vsphere, &vm, Duration::from_secs(5))
        .await;

    assert!(result.is_err());
}
