//! A minimal RESP (REdis Serialization Protocol) codec.
//!
//! The teacher repo has no `redis` dependency, and the pack's other
//! rate-limit reference (`DokaIzk-StellarRoute`) pulls in a full client
//! crate. To keep the dependency surface aligned with the teacher this
//! speaks just enough RESP2 over a raw [`tokio::net::TcpStream`] to issue
//! `AUTH`, `SELECT`, `INCR`, and `EXPIRE` — the four commands
//! [`crate::shared::SharedRateLimiter`] needs.

use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A parsed RESP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Option<String>),
    Array(Vec<Reply>),
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut buf = format!("*{}\r\n", args.len()).into_bytes();
    for arg in args {
        buf.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.extend_from_slice(arg.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

/// Write a single command.
pub async fn send_command<W: AsyncWrite + Unpin>(w: &mut W, args: &[&str]) -> io::Result<()> {
    w.write_all(&encode_command(args)).await
}

/// Write several commands back-to-back without waiting for replies
/// in between (RESP pipelining) — used to send `INCR` and `EXPIRE`
/// in a single round trip.
pub async fn send_pipeline<W: AsyncWrite + Unpin>(
    w: &mut W,
    commands: &[Vec<String>],
) -> io::Result<()> {
    let mut buf = Vec::new();
    for cmd in commands {
        let args: Vec<&str> = cmd.iter().map(String::as_str).collect();
        buf.extend_from_slice(&encode_command(&args));
    }
    w.write_all(&buf).await
}

/// Read and parse a single RESP reply. Recursive (for `Array`), so it
/// returns a boxed future — `async fn` cannot recurse directly.
pub fn read_reply<'a, R>(r: &'a mut R) -> Pin<Box<dyn Future<Output = io::Result<Reply>> + 'a>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    Box::pin(async move {
        let mut line = String::new();
        read_line(r, &mut line).await?;
        if line.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"));
        }
        let (tag, rest) = line.split_at(1);
        match tag {
            "+" => Ok(Reply::Simple(rest.to_string())),
            "-" => Ok(Reply::Error(rest.to_string())),
            ":" => rest
                .parse::<i64>()
                .map(Reply::Integer)
                .map_err(|_| invalid("malformed integer reply")),
            "$" => {
                let len: i64 = rest.parse().map_err(|_| invalid("malformed bulk length"))?;
                if len < 0 {
                    return Ok(Reply::Bulk(None));
                }
                let mut buf = vec![0u8; len as usize + 2];
                r.read_exact(&mut buf).await?;
                buf.truncate(len as usize);
                Ok(Reply::Bulk(Some(String::from_utf8_lossy(&buf).into_owned())))
            }
            "*" => {
                let len: i64 = rest.parse().map_err(|_| invalid("malformed array length"))?;
                if len < 0 {
                    return Ok(Reply::Array(Vec::new()));
                }
                let mut items = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    items.push(read_reply(r).await?);
                }
                Ok(Reply::Array(items))
            }
            other => Err(invalid(format!("unknown RESP tag {other:?}"))),
        }
    })
}

async fn read_line<R: AsyncBufRead + Unpin + ?Sized>(
    r: &mut R,
    out: &mut String,
) -> io::Result<()> {
    use tokio::io::AsyncBufReadExt;
    r.read_line(out).await?;
    while out.ends_with('\n') || out.ends_with('\r') {
        out.pop();
    }
    Ok(())
}
