//! Byte transports
//!
//! The driver only needs non-blocking polls: how many bytes are waiting,
//! read one, write a frame, and flush before writing.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Non-blocking byte link to the pump
pub trait Transport {
    /// Number of bytes that can be read without blocking
    fn available(&mut self) -> io::Result<usize>;

    /// Read one byte, `None` if nothing is waiting
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write a complete frame
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    /// Wait for pending output to drain. Called before every transmission.
    fn flush(&mut self) -> io::Result<()>;
}

/// Serial port (usually a USB RS-485 adapter)
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Wrap an opened port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Name of the underlying port, if known
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Transport for SerialTransport {
    fn available(&mut self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::other)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => Ok(None),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

/// TCP stream to a serial-over-IP bridge
///
/// The socket is non-blocking. Output the kernel will not take yet is kept
/// and pushed out on later calls, so a slow bridge never stalls a tick.
pub struct TcpTransport {
    stream: TcpStream,
    backlog: Vec<u8>,
}

impl TcpTransport {
    /// Wrap a connected stream, switching it to non-blocking mode
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            backlog: Vec::new(),
        })
    }

    /// Bytes accepted by `write_bytes` but not yet handed to the socket
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Write as much of the backlog as the socket takes right now
    fn drain_backlog(&mut self) -> io::Result<()> {
        while !self.backlog.is_empty() {
            match self.stream.write(&self.backlog) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.backlog.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "bridge closed the connection")
}

impl Transport for TcpTransport {
    fn available(&mut self) -> io::Result<usize> {
        // peek() reports at most the buffer size, which is plenty for one tick
        let mut buf = [0u8; 512];
        match self.stream.peek(&mut buf) {
            Ok(0) => Err(closed()),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.stream.read(&mut buf) {
            Ok(0) => Err(closed()),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.backlog.extend_from_slice(data);
        self.drain_backlog()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain_backlog()?;
        if self.backlog.is_empty() {
            self.stream.flush()
        } else {
            Ok(())
        }
    }
}
