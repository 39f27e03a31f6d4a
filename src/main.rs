//! plone 服务入口
//!
//! 用法：`plone [配置文件路径]`

use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    plone_lib::run(config_path).await
}
