// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use enumn::N;

use crate::bitstream::BitCursor;
use crate::error::Error;
use crate::error::Result;

/// Size of the HEVC NAL unit header in bytes.
pub const NAL_HEADER_BYTES: usize = 2;

#[derive(N, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum NalUnitType {
    TrailN = 0,
    TrailR = 1,
    TsaN = 2,
    TsaR = 3,
    StsaN = 4,
    StsaR = 5,
    RadlN = 6,
    RadlR = 7,
    RaslN = 8,
    RaslR = 9,
    BlaWLp = 16,
    BlaWRadl = 17,
    BlaNLp = 18,
    IdrWRadl = 19,
    IdrNLp = 20,
    CraNut = 21,
    Vps = 32,
    Sps = 33,
    Pps = 34,
    AudNut = 35,
    EosNut = 36,
    EobNut = 37,
    FdNut = 38,
    PrefixSei = 39,
    SuffixSei = 40,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NalHeader {
    /// Raw nal_unit_type; reserved values are kept as-is.
    pub nal_unit_type: u8,
    pub nuh_layer_id: u8,
    pub nuh_temporal_id: u8,
}

impl NalHeader {
    /// Parses the two header bytes at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<NalHeader> {
        if data.len() < NAL_HEADER_BYTES {
            return Err(Error::NalUnitTooShort(data.len()));
        }

        let mut reader = BitCursor::new(&data[..NAL_HEADER_BYTES]);
        if reader.get_bits(1) != 0 {
            return Err(Error::ForbiddenZeroBit);
        }

        let nal_unit_type = reader.get_bits(6) as u8;
        let nuh_layer_id = reader.get_bits(6) as u8;
        let temporal_id_plus1 = reader.get_bits(3) as u8;
        if temporal_id_plus1 == 0 {
            return Err(Error::InvalidTemporalId);
        }

        Ok(NalHeader {
            nal_unit_type,
            nuh_layer_id,
            nuh_temporal_id: temporal_id_plus1 - 1,
        })
    }

    /// The unit type, or `None` for reserved and unspecified values.
    pub fn unit_type(&self) -> Option<NalUnitType> {
        NalUnitType::n(self.nal_unit_type)
    }

    pub fn is_vcl(&self) -> bool {
        self.nal_unit_type < 32
    }

    /// Intra random access point: BLA, IDR, CRA and the reserved IRAP types 22..=23.
    pub fn is_irap(&self) -> bool {
        (16..=23).contains(&self.nal_unit_type)
    }

    pub fn is_idr(&self) -> bool {
        matches!(
            self.unit_type(),
            Some(NalUnitType::IdrWRadl) | Some(NalUnitType::IdrNLp)
        )
    }

    /// Sub-layer non-reference pictures have even VCL types up to 14.
    pub fn is_sub_layer_non_reference(&self) -> bool {
        self.nal_unit_type <= 14 && self.nal_unit_type % 2 == 0
    }
}
