//! Chunked result reassembly

use std::collections::HashMap;

/// Reassembles a job's binary result from index-keyed chunks
///
/// Arrival order is irrelevant: chunks are stored by index, a retransmitted
/// index overwrites its previous payload (last write wins) and never counts
/// twice toward completion, and absent indices simply delay completion.
#[derive(Debug, Default)]
pub struct ChunkAssembly {
    chunks: HashMap<u32, Vec<u8>>,
    expected: Option<u32>,
}

impl ChunkAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one chunk and the announced total
    pub fn insert(&mut self, index: u32, bytes: Vec<u8>, total_expected: u32) {
        self.expected = Some(total_expected);
        self.chunks.insert(index, bytes);
    }

    /// Number of distinct indices received so far
    pub fn received(&self) -> usize {
        self.chunks.len()
    }

    /// The announced total, once any chunk has arrived
    pub fn expected(&self) -> Option<u32> {
        self.expected
    }

    /// Complete when the count of distinct indices reaches the announced total
    pub fn is_complete(&self) -> bool {
        match self.expected {
            Some(total) => self.chunks.len() >= total as usize,
            None => false,
        }
    }

    /// Concatenates chunks strictly by ascending index, regardless of arrival order
    pub fn assemble(&self) -> Vec<u8> {
        let mut indexed: Vec<(&u32, &Vec<u8>)> = self.chunks.iter().collect();
        indexed.sort_unstable_by_key(|(index, _)| **index);
        indexed
            .into_iter()
            .flat_map(|(_, bytes)| bytes.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_arrival_assembles_by_index() {
        let mut assembly = ChunkAssembly::new();

        assembly.insert(2, b"cc".to_vec(), 3);
        assembly.insert(0, b"aa".to_vec(), 3);
        assert!(!assembly.is_complete());

        assembly.insert(1, b"bb".to_vec(), 3);
        assert!(assembly.is_complete());
        assert_eq!(assembly.assemble(), b"aabbcc");
    }

    #[test]
    fn test_every_arrival_permutation_assembles_identically() {
        let parts: [(u32, &[u8]); 3] = [(0, b"alpha"), (1, b"beta"), (2, b"gamma")];
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        for order in orders {
            let mut assembly = ChunkAssembly::new();
            for i in order {
                let (index, bytes) = parts[i];
                assembly.insert(index, bytes.to_vec(), 3);
            }
            assert!(assembly.is_complete());
            assert_eq!(assembly.assemble(), b"alphabetagamma");
        }
    }

    #[test]
    fn test_retransmission_does_not_complete_early() {
        let mut assembly = ChunkAssembly::new();

        assembly.insert(0, b"first".to_vec(), 2);
        assembly.insert(0, b"first again".to_vec(), 2);

        // Two arrivals but one distinct index.
        assert_eq!(assembly.received(), 1);
        assert!(!assembly.is_complete());

        assembly.insert(1, b"second".to_vec(), 2);
        assert!(assembly.is_complete());
        assert_eq!(assembly.assemble(), b"first againsecond");
    }

    #[test]
    fn test_empty_assembly_is_never_complete() {
        let assembly = ChunkAssembly::new();
        assert!(!assembly.is_complete());
        assert_eq!(assembly.expected(), None);
        assert!(assembly.assemble().is_empty());
    }
}
