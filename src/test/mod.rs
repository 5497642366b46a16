//! Synthetic DBI streams for unit tests.

use crate::dbi::{
    BuildNumber, DebugStream, HeaderFlags, Machine, StreamHeader, MODULE_RECORD_ALIGNMENT,
};

/// Byte offsets of every region in a stream produced by [`DbiStreamBuilder::build`].
#[derive(Debug, Clone, Copy)]
pub struct RegionOffsets {
    pub modules: usize,
    pub section_contributions: usize,
    pub section_map: usize,
    pub file_info: usize,
    pub type_server_map: usize,
    pub ec_info: usize,
    pub debug_header: usize,
    pub end: usize,
}

/// Assembles a complete DBI stream, region by region.
///
/// Skipped regions are filled with `0xCC`, module padding with `0xCD`.
#[derive(Debug, Clone)]
pub struct DbiStreamBuilder {
    modules: Vec<u8>,
    module_count: usize,
    section_contributions: usize,
    section_map: usize,
    file_info: Vec<u8>,
    type_server_map: usize,
    ec_info: usize,
    debug_streams: [i16; 11],
    debug_header_size: u32,
    machine: Machine,
}

impl Default for DbiStreamBuilder {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            module_count: 0,
            section_contributions: 0,
            section_map: 0,
            file_info: vec![0, 0, 0, 0],
            type_server_map: 0,
            ec_info: 0,
            debug_streams: [-1; 11],
            debug_header_size: 22,
            machine: Machine::Amd64,
        }
    }
}

impl DbiStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module record; its symbol stream is `10 + index`.
    pub fn module(mut self, module_name: &str, object_name: &str) -> Self {
        let stream = 10 + self.module_count as i16;

        self.modules.extend_from_slice(&0_u32.to_le_bytes());
        self.modules.extend_from_slice(&1_i16.to_le_bytes());
        self.modules.extend_from_slice(&[0, 0]);
        self.modules
            .extend_from_slice(&(0x1000 * self.module_count as i32).to_le_bytes());
        self.modules.extend_from_slice(&0x100_i32.to_le_bytes());
        self.modules.extend_from_slice(&0x6000_0020_u32.to_le_bytes());
        self.modules
            .extend_from_slice(&(self.module_count as i16).to_le_bytes());
        self.modules.extend_from_slice(&[0, 0]);
        self.modules.extend_from_slice(&0_u32.to_le_bytes());
        self.modules.extend_from_slice(&0_u32.to_le_bytes());
        self.modules.extend_from_slice(&0_u16.to_le_bytes());
        self.modules.extend_from_slice(&stream.to_le_bytes());
        self.modules.extend_from_slice(&0x40_u32.to_le_bytes());
        self.modules.extend_from_slice(&0_u32.to_le_bytes());
        self.modules.extend_from_slice(&0x20_u32.to_le_bytes());
        self.modules.extend_from_slice(&1_u16.to_le_bytes());
        self.modules.extend_from_slice(&[0, 0]);
        self.modules.extend_from_slice(&0_u32.to_le_bytes());
        self.modules.extend_from_slice(&0_u32.to_le_bytes());
        self.modules.extend_from_slice(&0_u32.to_le_bytes());
        self.modules.extend_from_slice(module_name.as_bytes());
        self.modules.push(0);
        self.modules.extend_from_slice(object_name.as_bytes());
        self.modules.push(0);

        while self.modules.len() % MODULE_RECORD_ALIGNMENT != 0 {
            self.modules.push(0xCD);
        }

        self.module_count += 1;
        self
    }

    /// Append raw bytes to the module-record region.
    pub fn module_padding(mut self, len: usize) -> Self {
        self.modules.resize(self.modules.len() + len, 0xCD);
        self
    }

    pub fn section_contributions(mut self, len: usize) -> Self {
        self.section_contributions = len;
        self
    }

    pub fn section_map(mut self, len: usize) -> Self {
        self.section_map = len;
        self
    }

    /// Replace the file-info region with the given tables.
    pub fn file_info(
        mut self,
        starts: &[u16],
        counts: &[u16],
        offsets: &[u32],
        names: &[u8],
    ) -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(&(starts.len() as u16).to_le_bytes());
        data.extend_from_slice(&(offsets.len() as u16).to_le_bytes());
        for start in starts {
            data.extend_from_slice(&start.to_le_bytes());
        }
        for count in counts {
            data.extend_from_slice(&count.to_le_bytes());
        }
        for offset in offsets {
            data.extend_from_slice(&offset.to_le_bytes());
        }
        data.extend_from_slice(names);

        self.file_info = data;
        self
    }

    pub fn type_server_map(mut self, len: usize) -> Self {
        self.type_server_map = len;
        self
    }

    pub fn ec_info(mut self, len: usize) -> Self {
        self.ec_info = len;
        self
    }

    pub fn debug_stream(mut self, kind: DebugStream, stream: i16) -> Self {
        self.debug_streams[kind as usize] = stream;
        self
    }

    /// Override the debug header size written to the header; the 22-byte table is always
    /// emitted.
    pub fn debug_header_size(mut self, size: u32) -> Self {
        self.debug_header_size = size;
        self
    }

    pub fn machine(mut self, machine: Machine) -> Self {
        self.machine = machine;
        self
    }

    pub fn region_offsets(&self) -> RegionOffsets {
        let modules = StreamHeader::SIZE;
        let section_contributions = modules + self.modules.len();
        let section_map = section_contributions + self.section_contributions;
        let file_info = section_map + self.section_map;
        let type_server_map = file_info + self.file_info.len();
        let ec_info = type_server_map + self.type_server_map;
        let debug_header = ec_info + self.ec_info;

        RegionOffsets {
            modules,
            section_contributions,
            section_map,
            file_info,
            type_server_map,
            ec_info,
            debug_header,
            end: debug_header + 22,
        }
    }

    pub fn header(&self) -> StreamHeader {
        StreamHeader {
            version: 19_990_903,
            age: 1,
            gs_symbols_stream: 7,
            build_number: BuildNumber::from(0x8E00),
            ps_symbols_stream: 8,
            pdb_dll_version: 0x6150,
            symbol_records_stream: 9,
            pdb_dll_rbld: 0,
            module_list_size: self.modules.len() as u32,
            section_contribution_size: self.section_contributions as u32,
            section_map_size: self.section_map as u32,
            file_info_size: self.file_info.len() as u32,
            type_server_map_size: self.type_server_map as u32,
            mfc_type_server_index: 0,
            debug_header_size: self.debug_header_size,
            ec_substream_size: self.ec_info as u32,
            flags: HeaderFlags::INCREMENTALLY_LINKED,
            machine: self.machine,
            reserved: 0,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = self.header().to_bytes().unwrap().to_vec();

        data.extend_from_slice(&self.modules);
        data.resize(data.len() + self.section_contributions, 0xCC);
        data.resize(data.len() + self.section_map, 0xCC);
        data.extend_from_slice(&self.file_info);
        data.resize(data.len() + self.type_server_map, 0xCC);
        data.resize(data.len() + self.ec_info, 0xCC);
        for stream in self.debug_streams {
            data.extend_from_slice(&stream.to_le_bytes());
        }

        data
    }
}
