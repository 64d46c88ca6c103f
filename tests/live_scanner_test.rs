//! 实时取景扫描器的状态机与资源管理性质。

mod common;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use barcode_studio::camera::testing::ScriptedCamera;
use barcode_studio::camera::{CameraBackend, CameraError, LiveScanner, ScannerState};
use barcode_studio::scanner::{ScanConfig, ScanResult};

fn live_config() -> ScanConfig {
    let mut config = ScanConfig::default();
    config.live_frame_interval_ms = 5;
    config
}

async fn wait_for_state(scanner: &LiveScanner, expected: ScannerState) {
    for _ in 0..400 {
        if scanner.state() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("scanner did not reach {:?} in time", expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_is_idempotent_and_safe_before_start() {
    let backend = Arc::new(ScriptedCamera::new(vec![common::blank_raw_image(64, 64)]));
    let mut scanner = LiveScanner::new(backend, live_config());

    // 未启动时 stop 为空操作
    scanner.stop().await;
    scanner.stop().await;
    assert_eq!(scanner.state(), ScannerState::Idle);
    assert!(scanner.current_device_id().is_none());

    scanner
        .start(|_| {}, |_| {})
        .await
        .expect("start should succeed");
    assert_eq!(scanner.state(), ScannerState::Streaming);

    scanner.stop().await;
    scanner.stop().await;
    assert_eq!(scanner.state(), ScannerState::Stopped);
    assert!(scanner.current_device_id().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn auto_stops_on_first_match_with_native_snapshot() {
    // 先给两帧空白，再给可解码帧：验证逐帧推进与首中即停
    let qr_frame = common::qr_raw_image("live-hit");
    let native_dims = (qr_frame.width(), qr_frame.height());
    let frames = vec![
        common::blank_raw_image(qr_frame.width(), qr_frame.height()),
        common::blank_raw_image(qr_frame.width(), qr_frame.height()),
        qr_frame,
    ];

    let backend = Arc::new(ScriptedCamera::new(frames));
    let mut scanner = LiveScanner::new(backend, live_config());

    let (tx, rx) = mpsc::channel::<ScanResult>();
    scanner
        .start(
            move |result| {
                let _ = tx.send(result);
            },
            |message| panic!("unexpected error callback: {}", message),
        )
        .await
        .expect("start should succeed");

    wait_for_state(&scanner, ScannerState::Stopped).await;

    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("scan callback should fire");
    assert_eq!(result.text, "live-hit");

    // 快照取原生分辨率帧
    let snapshot = result.snapshot.expect("snapshot should be attached");
    assert_eq!((snapshot.width(), snapshot.height()), native_dims);

    // 自动停止后不会再有第二次命中
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert!(scanner.current_device_id().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn permission_denial_surfaces_through_error_callback() {
    let backend =
        Arc::new(ScriptedCamera::new(vec![common::blank_raw_image(64, 64)]).deny_permission());
    let mut scanner = LiveScanner::new(backend, live_config());

    let (tx, rx) = mpsc::channel::<String>();
    let result = scanner
        .start(
            |_| panic!("scan callback should not fire"),
            move |message| {
                let _ = tx.send(message);
            },
        )
        .await;

    assert!(matches!(result, Err(CameraError::PermissionDenied(_))));
    assert_eq!(scanner.state(), ScannerState::Stopped);

    let message = rx
        .recv_timeout(Duration::from_secs(1))
        .expect("error callback should fire");
    assert!(message.contains("权限"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resolution_fallback_retries_unconstrained() {
    let backend = Arc::new(
        ScriptedCamera::new(vec![common::blank_raw_image(64, 64)]).reject_ideal_resolution(),
    );
    let mut scanner = LiveScanner::new(Arc::clone(&backend) as Arc<dyn CameraBackend>, live_config());

    scanner
        .start(|_| {}, |_| {})
        .await
        .expect("start should fall back to unconstrained acquisition");
    assert_eq!(scanner.state(), ScannerState::Streaming);
    scanner.stop().await;

    let constraints = backend.opened_constraints();
    assert_eq!(constraints.len(), 2);
    assert_eq!(constraints[0].ideal_resolution, Some((1920, 1080)));
    assert_eq!(constraints[1].ideal_resolution, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn switch_camera_rebinds_exclusive_session() {
    let backend = Arc::new(
        ScriptedCamera::new(vec![common::blank_raw_image(64, 64)])
            .with_extra_device("cam-1", "Scripted Camera 1"),
    );
    let mut scanner = LiveScanner::new(Arc::clone(&backend) as Arc<dyn CameraBackend>, live_config());

    let cameras = scanner
        .get_available_cameras()
        .expect("enumerate should succeed");
    assert_eq!(cameras.len(), 2);

    scanner
        .start(|_| {}, |_| {})
        .await
        .expect("start should succeed");
    assert_eq!(scanner.current_device_id().as_deref(), Some("cam-0"));

    scanner
        .switch_camera("cam-1")
        .await
        .expect("switch should succeed");
    assert_eq!(scanner.state(), ScannerState::Streaming);
    assert_eq!(scanner.current_device_id().as_deref(), Some("cam-1"));

    scanner.stop().await;

    // 切换到未知设备前必须处于取景中
    let mut idle_scanner =
        LiveScanner::new(Arc::new(ScriptedCamera::new(vec![])) as Arc<dyn CameraBackend>, live_config());
    assert!(matches!(
        idle_scanner.switch_camera("cam-9").await,
        Err(CameraError::InvalidState(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn torch_toggle_respects_capability() {
    // 支持手电筒的设备：开 -> 关
    let backend = Arc::new(ScriptedCamera::new(vec![common::blank_raw_image(64, 64)]).with_torch());
    let mut scanner = LiveScanner::new(backend, live_config());
    scanner
        .start(|_| {}, |_| {})
        .await
        .expect("start should succeed");

    assert!(scanner.toggle_torch().await);
    assert!(!scanner.toggle_torch().await);
    scanner.stop().await;

    // 不支持的设备：恒为 false，不是错误
    let plain = Arc::new(ScriptedCamera::new(vec![common::blank_raw_image(64, 64)]));
    let mut plain_scanner = LiveScanner::new(plain, live_config());
    plain_scanner
        .start(|_| {}, |_| {})
        .await
        .expect("start should succeed");
    assert!(!plain_scanner.toggle_torch().await);
    plain_scanner.stop().await;

    // 未取景时同样返回 false
    assert!(!plain_scanner.toggle_torch().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn frame_failure_stops_scanner_with_error() {
    let backend = Arc::new(
        ScriptedCamera::new(vec![
            common::blank_raw_image(64, 64),
            common::blank_raw_image(64, 64),
        ])
        .fail_frames_after(2),
    );
    let mut scanner = LiveScanner::new(backend, live_config());

    let (tx, rx) = mpsc::channel::<String>();
    scanner
        .start(
            |_| panic!("scan callback should not fire"),
            move |message| {
                let _ = tx.send(message);
            },
        )
        .await
        .expect("start should succeed");

    let message = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("error callback should fire");
    assert!(message.contains("相机流错误"));

    wait_for_state(&scanner, ScannerState::Stopped).await;
    assert!(scanner.current_device_id().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restart_after_stop_requires_fresh_start() {
    let backend = Arc::new(ScriptedCamera::new(vec![common::blank_raw_image(64, 64)]));
    let mut scanner = LiveScanner::new(backend, live_config());

    scanner
        .start(|_| {}, |_| {})
        .await
        .expect("first start should succeed");
    scanner.stop().await;
    assert_eq!(scanner.state(), ScannerState::Stopped);

    // 停止后不会自动恢复；重新 start 可再次进入取景
    scanner
        .start(|_| {}, |_| {})
        .await
        .expect("second start should succeed");
    assert_eq!(scanner.state(), ScannerState::Streaming);
    scanner.stop().await;
}
