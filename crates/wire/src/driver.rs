// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The driver-stream vocabulary.
//!
//! [`DriverEvent`] is what a driver emits unsolicited (and what the server
//! parses back into its shadow tree); [`DriverRequest`] is what travels the
//! other way. Values are held unescaped; escaping happens at the line
//! boundary in both directions.

use std::fmt;

use crate::{encode_arg, escape, WireError};

/// One unsolicited state-change event on a driver socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    SetInfo { var: String, val: String },
    DelInfo { var: String },
    AddEnum { var: String, val: String },
    DelEnum { var: String, val: String },
    AddRange { var: String, min: i64, max: i64 },
    DelRange { var: String, min: i64, max: i64 },
    AddCmd { cmd: String },
    DelCmd { cmd: String },
    SetAux { var: String, aux: i64 },
    SetFlags { var: String, flags: Vec<String> },
    DataOk,
    DataStale,
    DumpDone,
    Pong,
}

impl DriverEvent {
    /// Parse tokenized arguments into an event.
    pub fn parse(args: &[String]) -> Result<Self, WireError> {
        let verb = args.first().ok_or(WireError::BadArgCount("<empty>"))?;

        match verb.to_ascii_uppercase().as_str() {
            "DATAOK" => Ok(Self::DataOk),
            "DATASTALE" => Ok(Self::DataStale),
            "DUMPDONE" => Ok(Self::DumpDone),
            "PONG" => Ok(Self::Pong),
            "DELINFO" => Ok(Self::DelInfo { var: arg(args, 1, "DELINFO")? }),
            "ADDCMD" => Ok(Self::AddCmd { cmd: arg(args, 1, "ADDCMD")? }),
            "DELCMD" => Ok(Self::DelCmd { cmd: arg(args, 1, "DELCMD")? }),
            "SETINFO" => {
                Ok(Self::SetInfo { var: arg(args, 1, "SETINFO")?, val: arg(args, 2, "SETINFO")? })
            }
            "ADDENUM" => {
                Ok(Self::AddEnum { var: arg(args, 1, "ADDENUM")?, val: arg(args, 2, "ADDENUM")? })
            }
            "DELENUM" => {
                Ok(Self::DelEnum { var: arg(args, 1, "DELENUM")?, val: arg(args, 2, "DELENUM")? })
            }
            "ADDRANGE" => Ok(Self::AddRange {
                var: arg(args, 1, "ADDRANGE")?,
                min: int_arg(args, 2, "ADDRANGE")?,
                max: int_arg(args, 3, "ADDRANGE")?,
            }),
            "DELRANGE" => Ok(Self::DelRange {
                var: arg(args, 1, "DELRANGE")?,
                min: int_arg(args, 2, "DELRANGE")?,
                max: int_arg(args, 3, "DELRANGE")?,
            }),
            "SETAUX" => {
                Ok(Self::SetAux { var: arg(args, 1, "SETAUX")?, aux: int_arg(args, 2, "SETAUX")? })
            }
            "SETFLAGS" => {
                let var = arg(args, 1, "SETFLAGS")?;
                if args.len() < 3 {
                    return Err(WireError::BadArgCount("SETFLAGS"));
                }
                Ok(Self::SetFlags { var, flags: args[2..].to_vec() })
            }
            _ => Err(WireError::UnknownVerb(verb.clone())),
        }
    }

    /// Format as one wire line, newline included.
    pub fn to_line(&self) -> String {
        match self {
            Self::SetInfo { var, val } => format!("SETINFO {var} \"{}\"\n", escape(val)),
            Self::DelInfo { var } => format!("DELINFO {var}\n"),
            Self::AddEnum { var, val } => format!("ADDENUM {var} \"{}\"\n", escape(val)),
            Self::DelEnum { var, val } => format!("DELENUM {var} \"{}\"\n", escape(val)),
            Self::AddRange { var, min, max } => format!("ADDRANGE {var} {min} {max}\n"),
            Self::DelRange { var, min, max } => format!("DELRANGE {var} {min} {max}\n"),
            Self::AddCmd { cmd } => format!("ADDCMD {cmd}\n"),
            Self::DelCmd { cmd } => format!("DELCMD {cmd}\n"),
            Self::SetAux { var, aux } => format!("SETAUX {var} {aux}\n"),
            Self::SetFlags { var, flags } => {
                let mut line = format!("SETFLAGS {var}");
                for flag in flags {
                    line.push(' ');
                    line.push_str(flag);
                }
                line.push('\n');
                line
            }
            Self::DataOk => "DATAOK\n".to_string(),
            Self::DataStale => "DATASTALE\n".to_string(),
            Self::DumpDone => "DUMPDONE\n".to_string(),
            Self::Pong => "PONG\n".to_string(),
        }
    }
}

impl fmt::Display for DriverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_line().trim_end())
    }
}

/// One request sent to a driver socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverRequest {
    DumpAll,
    Ping,
    InstCmd { cmd: String, arg: Option<String> },
    Set { var: String, val: String },
}

impl DriverRequest {
    pub fn parse(args: &[String]) -> Result<Self, WireError> {
        let verb = args.first().ok_or(WireError::BadArgCount("<empty>"))?;

        match verb.to_ascii_uppercase().as_str() {
            "DUMPALL" => Ok(Self::DumpAll),
            "PING" => Ok(Self::Ping),
            "INSTCMD" => Ok(Self::InstCmd {
                cmd: arg(args, 1, "INSTCMD")?,
                arg: args.get(2).cloned(),
            }),
            "SET" => Ok(Self::Set { var: arg(args, 1, "SET")?, val: arg(args, 2, "SET")? }),
            _ => Err(WireError::UnknownVerb(verb.clone())),
        }
    }

    /// Format as one wire line, newline included.
    pub fn to_line(&self) -> String {
        match self {
            Self::DumpAll => "DUMPALL\n".to_string(),
            Self::Ping => "PING\n".to_string(),
            Self::InstCmd { cmd, arg: None } => format!("INSTCMD {cmd}\n"),
            Self::InstCmd { cmd, arg: Some(a) } => {
                format!("INSTCMD {cmd} {}\n", encode_arg(a))
            }
            Self::Set { var, val } => format!("SET {var} {}\n", encode_arg(val)),
        }
    }
}

fn arg(args: &[String], idx: usize, verb: &'static str) -> Result<String, WireError> {
    args.get(idx).cloned().ok_or(WireError::BadArgCount(verb))
}

fn int_arg(args: &[String], idx: usize, verb: &'static str) -> Result<i64, WireError> {
    let raw = args.get(idx).ok_or(WireError::BadArgCount(verb))?;
    raw.parse().map_err(|_| WireError::BadInteger(raw.clone()))
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
