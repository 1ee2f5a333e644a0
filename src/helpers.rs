use crate::core_network::ControlWriter;
use log::trace;
use tokio::io::AsyncWriteExt;

/// Sends a reply line (already `\r\n`-terminated) on the control connection.
pub async fn send_response(writer: &ControlWriter, message: &[u8]) -> Result<(), std::io::Error> {
    trace!("--> {}", String::from_utf8_lossy(message).trim_end());
    let mut writer = writer.lock().await;
    writer.write_all(message).await?;
    writer.flush().await?;
    Ok(())
}
