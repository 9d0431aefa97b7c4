//! 基于 `serialport` 的串口传输

use crate::{
    Transport, TransportConfig, TransportDeviceError, TransportDeviceErrorKind, TransportError,
};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// 串口传输（8-N-1）
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// 打开串口
    ///
    /// # 错误
    /// - `TransportError::Device`: 串口不存在、无权限或参数不被支持
    pub fn open(config: &TransportConfig) -> Result<Self, TransportError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout())
            .open()
            .map_err(|e| map_serial_error(&config.port, e))?;

        debug!(
            "Serial port '{}' opened at {} baud (8-N-1)",
            config.port, config.baud_rate
        );

        Ok(Self {
            port,
            name: config.port.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn map_serial_error(port: &str, e: serialport::Error) -> TransportError {
    let kind = match e.kind() {
        serialport::ErrorKind::NoDevice => TransportDeviceErrorKind::NotFound,
        serialport::ErrorKind::InvalidInput => TransportDeviceErrorKind::UnsupportedConfig,
        serialport::ErrorKind::Io(ErrorKind::PermissionDenied) => {
            TransportDeviceErrorKind::AccessDenied
        },
        serialport::ErrorKind::Io(ErrorKind::NotFound) => TransportDeviceErrorKind::NotFound,
        serialport::ErrorKind::Io(_) => TransportDeviceErrorKind::Backend,
        serialport::ErrorKind::Unknown => TransportDeviceErrorKind::Unknown,
    };
    TransportError::Device(TransportDeviceError::new(
        kind,
        format!("{}: {}", port, e.description),
    ))
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        trace!("TX [{}]: {}", self.name, hex::encode(bytes));
        match self.port.write_all(bytes) {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::TimedOut => return Err(TransportError::Timeout),
            Err(e) => return Err(TransportError::Io(e)),
        }
        self.port.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.port.read(buf) {
            Ok(n) => {
                if n > 0 {
                    trace!("RX [{}]: {}", self.name, hex::encode(&buf[..n]));
                }
                Ok(n)
            },
            // 读超时不是错误：由上层判定"无响应"
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        self.port
            .clear(ClearBuffer::All)
            .map_err(|e| map_serial_error(&self.name, e))
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.port.set_timeout(timeout).map_err(|e| map_serial_error(&self.name, e))
    }
}
