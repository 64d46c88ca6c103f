//! # 条码识别工具 — 命令行入口
//!
//! 本文件仅负责初始化与参数适配，业务逻辑分布在各子模块中，
//! 详见 `lib.rs` 架构文档。
//!
//! 用法：`barcode-studio [--profile thorough|quick] <图片路径>...`
//! 每个输入输出一行 JSON（`ImageScanResponse`）；全部未命中时退出码为 1。

use barcode_studio::scanner::ScanServiceState;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mut profile: Option<String> = None;
    let mut paths: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--profile" => match args.next() {
                Some(value) => profile = Some(value),
                None => {
                    eprintln!("--profile 需要一个取值（thorough / quick）");
                    std::process::exit(2);
                }
            },
            "--help" | "-h" => {
                println!("用法：barcode-studio [--profile thorough|quick] <图片路径>...");
                return;
            }
            _ => paths.push(arg),
        }
    }

    if paths.is_empty() {
        eprintln!("用法：barcode-studio [--profile thorough|quick] <图片路径>...");
        std::process::exit(2);
    }

    let service = ScanServiceState::new();

    if let Some(profile) = profile {
        if let Err(err) = service.set_sweep_profile(&profile) {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    }

    let mut any_hit = false;
    for path in paths {
        match service.scan_file(path.clone()) {
            Ok(response) => {
                if response.success {
                    any_hit = true;
                }
                match serde_json::to_string(&response) {
                    Ok(json) => println!("{}", json),
                    Err(err) => log::error!("响应序列化失败: {}", err),
                }
            }
            Err(err) => {
                log::error!("识别 {} 失败: {}", path, err);
                eprintln!("{}: {}", path, err);
            }
        }
    }

    if !any_hit {
        std::process::exit(1);
    }
}
