//! Inbound looper/lister messages

use rosc::{OscMessage, OscPacket, OscType};
use thiserror::Error;

/// Errors for datagrams the gateway cannot use
#[derive(Debug, Error, PartialEq)]
pub enum FeedbackError {
    #[error("unknown feedback address '{0}'")]
    UnknownAddress(String),
    #[error("'{addr}' expects {expected} arguments, got {got}")]
    Arity {
        addr: String,
        expected: usize,
        got: usize,
    },
    #[error("'{addr}' argument {index} should be {expected}")]
    ArgType {
        addr: String,
        index: usize,
        expected: &'static str,
    },
    #[error("undecodable datagram: {0}")]
    Decode(String),
}

/// Engine identity and loop count, from `/info` or `/pong`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LooperInfo {
    pub host: String,
    pub version: String,
    pub loopcount: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Update {
        track: i32,
        ctrl: String,
        value: f32,
    },
    Glob {
        ctrl: String,
        value: f32,
    },
    Info(LooperInfo),
    Pong(Option<LooperInfo>),
    Sessions(Vec<String>),
    Error(String),
}

struct Args<'a> {
    addr: &'a str,
    args: &'a [OscType],
}

impl<'a> Args<'a> {
    fn arity(&self, expected: usize) -> Result<(), FeedbackError> {
        if self.args.len() != expected {
            return Err(FeedbackError::Arity {
                addr: self.addr.to_string(),
                expected,
                got: self.args.len(),
            });
        }
        Ok(())
    }

    fn type_error(&self, index: usize, expected: &'static str) -> FeedbackError {
        FeedbackError::ArgType {
            addr: self.addr.to_string(),
            index,
            expected,
        }
    }

    fn string(&self, index: usize) -> Result<String, FeedbackError> {
        match self.args.get(index) {
            Some(OscType::String(s)) => Ok(s.clone()),
            _ => Err(self.type_error(index, "a string")),
        }
    }

    fn int(&self, index: usize) -> Result<i32, FeedbackError> {
        match self.args.get(index) {
            Some(OscType::Int(v)) => Ok(*v),
            Some(OscType::Long(v)) => Ok(*v as i32),
            Some(OscType::Float(v)) if v.fract() == 0.0 => Ok(*v as i32),
            _ => Err(self.type_error(index, "an integer")),
        }
    }

    fn float(&self, index: usize) -> Result<f32, FeedbackError> {
        match self.args.get(index) {
            Some(OscType::Float(v)) => Ok(*v),
            Some(OscType::Double(v)) => Ok(*v as f32),
            Some(OscType::Int(v)) => Ok(*v as f32),
            _ => Err(self.type_error(index, "a number")),
        }
    }

    fn info(&self) -> Result<LooperInfo, FeedbackError> {
        self.arity(3)?;
        let loopcount = self.int(2)?;
        Ok(LooperInfo {
            host: self.string(0)?,
            version: self.string(1)?,
            loopcount: loopcount.max(0) as usize,
        })
    }
}

impl Feedback {
    pub fn parse(msg: &OscMessage) -> Result<Self, FeedbackError> {
        let args = Args {
            addr: &msg.addr,
            args: &msg.args,
        };
        match msg.addr.as_str() {
            "/update" => {
                args.arity(3)?;
                Ok(Feedback::Update {
                    track: args.int(0)?,
                    ctrl: args.string(1)?,
                    value: args.float(2)?,
                })
            }
            "/glob" => {
                args.arity(3)?;
                Ok(Feedback::Glob {
                    ctrl: args.string(1)?,
                    value: args.float(2)?,
                })
            }
            "/info" => Ok(Feedback::Info(args.info()?)),
            "/pong" if msg.args.is_empty() => Ok(Feedback::Pong(None)),
            "/pong" => Ok(Feedback::Pong(Some(args.info()?))),
            "/sessions" => {
                let names = (0..msg.args.len())
                    .map(|i| args.string(i))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Feedback::Sessions(names))
            }
            "/error" => {
                let text = msg
                    .args
                    .iter()
                    .map(|a| match a {
                        OscType::String(s) => s.clone(),
                        other => format!("{:?}", other),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(Feedback::Error(text))
            }
            other => Err(FeedbackError::UnknownAddress(other.to_string())),
        }
    }

    /// Flatten a packet (bundles included) into parsed messages
    pub fn from_packet(packet: &OscPacket) -> Vec<Result<Self, FeedbackError>> {
        match packet {
            OscPacket::Message(msg) => vec![Self::parse(msg)],
            OscPacket::Bundle(bundle) => bundle.content.iter().flat_map(Self::from_packet).collect(),
        }
    }

    /// Decode a raw datagram
    pub fn from_datagram(data: &[u8]) -> Vec<Result<Self, FeedbackError>> {
        match rosc::decoder::decode_udp(data) {
            Ok((_, packet)) => Self::from_packet(&packet),
            Err(e) => vec![Err(FeedbackError::Decode(format!("{:?}", e)))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::encoder;

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[test]
    fn test_update() {
        let fb = Feedback::parse(&msg(
            "/update",
            vec![OscType::Int(1), OscType::String("state".into()), OscType::Float(4.0)],
        ));

        assert_eq!(
            fb,
            Ok(Feedback::Update {
                track: 1,
                ctrl: "state".into(),
                value: 4.0
            })
        );
    }

    #[test]
    fn test_info_and_pong() {
        let info_args = vec![
            OscType::String("osc.udp://host:9951/".into()),
            OscType::String("1.7.4".into()),
            OscType::Int(3),
        ];

        let info = Feedback::parse(&msg("/info", info_args.clone())).unwrap();
        assert!(matches!(info, Feedback::Info(LooperInfo { loopcount: 3, .. })));

        let pong = Feedback::parse(&msg("/pong", info_args)).unwrap();
        assert!(matches!(pong, Feedback::Pong(Some(LooperInfo { loopcount: 3, .. }))));

        assert_eq!(Feedback::parse(&msg("/pong", vec![])), Ok(Feedback::Pong(None)));
    }

    #[test]
    fn test_malformed_is_rejected() {
        assert!(matches!(
            Feedback::parse(&msg("/update", vec![OscType::Int(1)])),
            Err(FeedbackError::Arity { expected: 3, got: 1, .. })
        ));
        assert!(matches!(
            Feedback::parse(&msg(
                "/glob",
                vec![OscType::Int(0), OscType::Int(5), OscType::Float(1.0)]
            )),
            Err(FeedbackError::ArgType { index: 1, .. })
        ));
        assert_eq!(
            Feedback::parse(&msg("/nope", vec![])),
            Err(FeedbackError::UnknownAddress("/nope".into()))
        );
    }

    #[test]
    fn test_sessions() {
        let fb = Feedback::parse(&msg(
            "/sessions",
            vec![
                OscType::String("session-00.slsess".into()),
                OscType::String("session-03.slsess".into()),
            ],
        ));

        assert_eq!(
            fb,
            Ok(Feedback::Sessions(vec![
                "session-00.slsess".into(),
                "session-03.slsess".into()
            ]))
        );
    }

    #[test]
    fn test_datagram_decoding() {
        let packet = OscPacket::Message(msg(
            "/glob",
            vec![OscType::Int(0), OscType::String("wet".into()), OscType::Float(0.25)],
        ));
        let bytes = encoder::encode(&packet).unwrap();

        assert_eq!(
            Feedback::from_datagram(&bytes),
            vec![Ok(Feedback::Glob {
                ctrl: "wet".into(),
                value: 0.25
            })]
        );
        assert!(matches!(
            Feedback::from_datagram(&[1, 2, 3])[0],
            Err(FeedbackError::Decode(_))
        ));
    }
}
