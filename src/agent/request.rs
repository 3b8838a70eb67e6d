//! Request decode, authentication, and per-operation dispatch.

use bytes::Bytes;
use std::net::SocketAddr;

use crate::access::Community;
use crate::error::{Error, ErrorStatus, Result};
use crate::message::CommunityMessage;
use crate::oid::Oid;
use crate::pdu::{BulkParams, Pdu, PduType};
use crate::transport::AgentTransport;
use crate::value::Value;
use crate::varbind::{VarBind, VarBindBuffer};
use crate::version::Version;

use super::{Agent, AuthFailurePolicy, RESPONSE_OVERHEAD, Statistics};

impl<T: AgentTransport> Agent<T> {
    /// Process one inbound datagram and produce the response bytes.
    ///
    /// Returns `None` when no response should be sent (unknown
    /// community under the silent-drop policy, non-request PDU).
    pub(super) async fn handle_datagram(
        &self,
        data: Bytes,
        source: SocketAddr,
    ) -> Result<Option<Bytes>> {
        let stats = &self.inner.stats;
        Statistics::incr(&stats.in_pkts);

        let msg = match CommunityMessage::decode(data, source) {
            Ok(msg) => msg,
            Err(e) => {
                match &*e {
                    Error::UnsupportedVersion { .. } => Statistics::incr(&stats.in_bad_versions),
                    _ => Statistics::incr(&stats.in_asn_parse_errs),
                }
                return Err(e);
            }
        };

        if !msg.pdu.pdu_type.is_request() {
            tracing::debug!(target: "async_snmp_agent::agent", { snmp.source = %source, snmp.pdu_type = %msg.pdu.pdu_type }, "ignoring non-request PDU");
            return Ok(None);
        }

        // RFC 3584: a v1 agent silently discards GetBulk.
        if msg.version == Version::V1 && msg.pdu.pdu_type == PduType::GetBulkRequest {
            tracing::debug!(target: "async_snmp_agent::agent", { snmp.source = %source }, "GetBulk in a v1 message, discarding");
            return Ok(None);
        }

        let Some(community) = self.inner.access.authenticate(&msg.community) else {
            Statistics::incr(&stats.in_bad_community_names);
            tracing::debug!(target: "async_snmp_agent::agent", { snmp.source = %source, snmp.community = %crate::util::HexBytes(&msg.community) }, "unknown community");
            return match self.inner.auth_failure_policy {
                AuthFailurePolicy::SilentDrop => Ok(None),
                AuthFailurePolicy::ErrorResponse => {
                    let response = msg
                        .pdu
                        .to_error_response(ErrorStatus::AuthorizationError, 0);
                    self.finalize(msg.version, msg.community.clone(), response)
                }
            };
        };

        match msg.pdu.pdu_type {
            PduType::GetRequest => Statistics::incr(&stats.in_get_requests),
            PduType::SetRequest => Statistics::incr(&stats.in_set_requests),
            // GetBulk is repeated GetNext as far as the counters care
            _ => Statistics::incr(&stats.in_get_nexts),
        }

        let response = match msg.pdu.pdu_type {
            PduType::GetRequest => self.handle_get(msg.version, community, &msg.pdu),
            PduType::GetNextRequest => self.handle_get_next(msg.version, community, &msg.pdu),
            PduType::GetBulkRequest => self.handle_get_bulk(community, &msg.pdu),
            PduType::SetRequest => self.handle_set(community, &msg.pdu),
            // is_request() admits nothing else
            _ => msg.pdu.to_error_response(ErrorStatus::GenErr, 0),
        };

        self.finalize(msg.version, msg.community, response)
    }

    /// Downgrade, encode, and size-check a response PDU.
    fn finalize(&self, version: Version, community: Bytes, mut pdu: Pdu) -> Result<Option<Bytes>> {
        if version == Version::V1 {
            pdu.error_status = pdu.error_status_enum().downgrade_for_v1().as_i32();
        }

        let request_id = pdu.request_id;
        let mut bytes = CommunityMessage::new(version, community.clone(), pdu).encode();

        if bytes.len() > self.inner.max_message_size {
            // RFC 3416 4.2.1: answer tooBig with an empty varbind list
            let too_big = Pdu {
                pdu_type: PduType::Response,
                request_id,
                error_status: ErrorStatus::TooBig.as_i32(),
                error_index: 0,
                varbinds: Vec::new(),
            };
            bytes = CommunityMessage::new(version, community, too_big).encode();

            if bytes.len() > self.inner.max_message_size {
                tracing::debug!(
                    target: "async_snmp_agent::agent",
                    { snmp.size = bytes.len(), snmp.max = self.inner.max_message_size },
                    "even tooBig response exceeds max message size, dropping"
                );
                return Ok(None);
            }
        }

        Statistics::incr(&self.inner.stats.out_get_responses);
        Ok(Some(bytes))
    }

    fn handle_get(&self, version: Version, community: &Community, pdu: &Pdu) -> Pdu {
        let mut varbinds = Vec::with_capacity(pdu.varbinds.len());

        for (index, vb) in pdu.varbinds.iter().enumerate() {
            // A non-readable OID looks absent, like the VACM treatment
            let visible = community.allows(&vb.oid, false);

            let value = match self.inner.mib.get(&vb.oid) {
                Ok(Some(value)) if visible => value,
                Ok(Some(_)) | Ok(None) => {
                    if version == Version::V1 {
                        return pdu.to_error_response(ErrorStatus::NoSuchName, one_based(index));
                    }
                    Value::NoSuchObject
                }
                Err(ErrorStatus::NoSuchName) => {
                    // The node exists but the instance does not
                    if version == Version::V1 {
                        return pdu.to_error_response(ErrorStatus::NoSuchName, one_based(index));
                    }
                    if visible {
                        Value::NoSuchInstance
                    } else {
                        Value::NoSuchObject
                    }
                }
                Err(status) => {
                    return pdu.to_error_response(status, one_based(index));
                }
            };

            varbinds.push(VarBind::new(vb.oid.clone(), value));
        }

        pdu.to_response(varbinds)
    }

    fn handle_get_next(&self, version: Version, community: &Community, pdu: &Pdu) -> Pdu {
        let mut varbinds = Vec::with_capacity(pdu.varbinds.len());

        for (index, vb) in pdu.varbinds.iter().enumerate() {
            match self.readable_next(community, &vb.oid) {
                Some((next_oid, value)) => {
                    varbinds.push(VarBind::new(next_oid, value));
                }
                None => {
                    if version == Version::V1 {
                        return pdu.to_error_response(ErrorStatus::NoSuchName, one_based(index));
                    }
                    varbinds.push(VarBind::new(vb.oid.clone(), Value::EndOfMibView));
                }
            }
        }

        pdu.to_response(varbinds)
    }

    fn handle_set(&self, community: &Community, pdu: &Pdu) -> Pdu {
        let mut varbinds = Vec::with_capacity(pdu.varbinds.len());

        for (index, vb) in pdu.varbinds.iter().enumerate() {
            if !community.allows(&vb.oid, true) {
                return pdu.to_error_response(ErrorStatus::NoAccess, one_based(index));
            }

            match self.inner.mib.set(&vb.oid, &vb.value) {
                Ok(Some(written)) => {
                    varbinds.push(VarBind::new(vb.oid.clone(), written));
                }
                Ok(None) => {
                    // No node covers this OID
                    return pdu.to_error_response(ErrorStatus::NotWritable, one_based(index));
                }
                Err(status) => {
                    return pdu.to_error_response(status, one_based(index));
                }
            }
        }

        pdu.to_response(varbinds)
    }

    /// GETBULK (RFC 3416 4.2.3): non-repeaters get one GETNEXT each,
    /// repeaters are iterated up to max-repetitions, and the response
    /// is truncated to fit the maximum message size.
    fn handle_get_bulk(&self, community: &Community, pdu: &Pdu) -> Pdu {
        let params = BulkParams::from_pdu(pdu);
        let budget = self
            .inner
            .max_message_size
            .saturating_sub(RESPONSE_OVERHEAD);
        let mut buffer = VarBindBuffer::new(budget);

        for vb in pdu.varbinds.iter().take(params.non_repeaters) {
            let next = match self.readable_next(community, &vb.oid) {
                Some((oid, value)) => VarBind::new(oid, value),
                None => VarBind::new(vb.oid.clone(), Value::EndOfMibView),
            };

            if buffer.push(next).is_err() {
                if buffer.is_empty() {
                    return pdu.to_error_response(ErrorStatus::TooBig, 0);
                }
                return pdu.to_response(buffer.into_varbinds());
            }
        }

        if params.non_repeaters < pdu.varbinds.len() {
            let repeaters = &pdu.varbinds[params.non_repeaters..];
            let mut cursors: Vec<Oid> = repeaters.iter().map(|vb| vb.oid.clone()).collect();
            let mut done = vec![false; repeaters.len()];

            'rows: for _ in 0..params.max_repetitions {
                let mut row_exhausted = true;

                for (i, cursor) in cursors.iter_mut().enumerate() {
                    let next = if done[i] {
                        VarBind::new(cursor.clone(), Value::EndOfMibView)
                    } else {
                        match self.readable_next(community, cursor) {
                            Some((oid, value)) => {
                                *cursor = oid.clone();
                                row_exhausted = false;
                                VarBind::new(oid, value)
                            }
                            None => {
                                done[i] = true;
                                VarBind::new(cursor.clone(), Value::EndOfMibView)
                            }
                        }
                    };

                    if buffer.push(next).is_err() {
                        break 'rows;
                    }
                }

                if row_exhausted {
                    break;
                }
            }
        }

        if buffer.is_empty() {
            return pdu.to_error_response(ErrorStatus::TooBig, 0);
        }
        pdu.to_response(buffer.into_varbinds())
    }

    /// Next readable instance strictly after `start`.
    ///
    /// Instances the community may not read are stepped over, so a
    /// walk sees the permitted parts of the tree as contiguous.
    fn readable_next(&self, community: &Community, start: &Oid) -> Option<(Oid, Value)> {
        let mut cursor = start.clone();
        loop {
            let (oid, value) = self.inner.mib.next_after(&cursor)?;
            if community.allows(&oid, false) {
                return Some((oid, value));
            }
            cursor = oid;
        }
    }
}

fn one_based(index: usize) -> i32 {
    (index + 1) as i32
}
