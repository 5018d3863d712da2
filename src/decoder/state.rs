//! The node-decoder state machine

use super::core::ModelDecoder;
use super::node::{ElementDecoder, NodeKind};
use super::scanner::Scanner;
use super::token::{Token, TokenReader, XmlName, unexpected_eof};
use super::{NS_CORE, is_native_namespace};
use crate::cancel::{CancelReason, CancellationToken};
use crate::error::{Error, Result};
use crate::extension::ElementContext;

/// When the state machine looks at the cancellation token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CancelPolicy {
    /// After the first end element past every `n` bytes of input
    EveryBytes(u64),
    /// After every end element
    EveryElement,
}

/// Bottom of the stack: accepts only the core `<model>` element
struct TopLevelDecoder;

impl ElementDecoder for TopLevelDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Root
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        (name.space == NS_CORE && name.local == "model")
            .then(|| Box::new(ModelDecoder::default()) as Box<dyn ElementDecoder>)
    }
}

struct Frame {
    decoder: Box<dyn ElementDecoder>,
    name: Option<XmlName>,
}

fn cancelled(cancel: &CancellationToken) -> Error {
    Error::Cancelled(cancel.reason().unwrap_or(CancelReason::Cancelled))
}

/// Drive `tokens` through a stack of element decoders into `scanner`
///
/// Returns the first fatal error recorded by a decoder, a token error, or the
/// cancellation reason. End of stream is success once every opened element
/// has been closed.
pub(crate) fn decode_part(
    tokens: &mut dyn TokenReader,
    scanner: &mut Scanner,
    cancel: &CancellationToken,
    policy: CancelPolicy,
) -> Result<()> {
    let registry = std::sync::Arc::clone(scanner.registry());
    let mut stack: Vec<Frame> = Vec::with_capacity(16);
    let mut current: Box<dyn ElementDecoder> = Box::new(TopLevelDecoder);
    let mut current_name: Option<XmlName> = None;
    let mut next_check = match policy {
        CancelPolicy::EveryBytes(interval) => interval,
        CancelPolicy::EveryElement => 0,
    };

    loop {
        let token = match tokens.token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                if !stack.is_empty() {
                    scanner.fail(unexpected_eof(stack.len()));
                }
                break;
            }
            Err(e) => {
                scanner.fail(e);
                break;
            }
        };

        match token {
            Token::Start { name, attrs } => {
                let child = current.child(scanner, &name).or_else(|| {
                    if is_native_namespace(&name.space) {
                        return None;
                    }
                    registry.element_decoder(&ElementContext {
                        parent: current.kind(),
                        name: &name,
                    })
                });
                match child {
                    Some(mut decoder) => {
                        scanner.set_element(&name.local);
                        decoder.start(scanner, &attrs);
                        stack.push(Frame {
                            decoder: std::mem::replace(&mut current, decoder),
                            name: current_name.replace(name),
                        });
                    }
                    None => {
                        if let Err(e) = tokens.skip() {
                            scanner.fail(e);
                        }
                    }
                }
            }
            Token::CharData(text) => current.char_data(scanner, &text),
            Token::End(name) => {
                if current_name.as_ref() == Some(&name)
                    && let Some(parent) = stack.pop()
                {
                    scanner.set_element(&name.local);
                    let node = current.end(scanner);
                    current = parent.decoder;
                    current_name = parent.name;
                    if let Some(node) = node {
                        current.accept(scanner, node);
                    }
                }

                match policy {
                    CancelPolicy::EveryElement => {
                        if cancel.is_cancelled() {
                            return Err(cancelled(cancel));
                        }
                    }
                    CancelPolicy::EveryBytes(interval) => {
                        if tokens.input_offset() > next_check {
                            if cancel.is_cancelled() {
                                return Err(cancelled(cancel));
                            }
                            next_check = next_check.saturating_add(interval.max(1));
                        }
                    }
                }
            }
        }

        if scanner.has_error() {
            break;
        }
    }

    match scanner.err.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
