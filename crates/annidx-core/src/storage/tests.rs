use super::*;

#[test]
fn test_page_add_and_get_item() {
    let mut page = Page::new(PageType::HnswElement);
    let offno = page.add_item(vec![1, 2, 3]).unwrap();
    assert_eq!(page.get_item(offno).unwrap(), &[1, 2, 3]);
}

#[test]
fn test_page_set_item_round_trips() {
    let mut page = Page::new(PageType::HnswElement);
    let offno = page.add_item(vec![1, 2, 3]).unwrap();
    page.set_item(offno, vec![4, 5]).unwrap();
    assert_eq!(page.get_item(offno).unwrap(), &[4, 5]);
}

#[test]
fn test_page_rejects_overflow() {
    let mut page = Page::new(PageType::HnswElement);
    let big = vec![0u8; PAGE_SIZE];
    assert!(page.add_item(big).is_err());
}

#[test]
fn test_page_invalid_offno_is_corrupt() {
    let page = Page::new(PageType::HnswElement);
    let err = page.get_item(1).unwrap_err();
    assert_eq!(err.code(), "ANNIDX-008");
}

#[test]
fn test_buffer_manager_alloc_write_read() {
    let bm = InMemoryBufferManager::new();
    let blkno = bm.new_page(PageType::HnswElement).unwrap();
    let mut page = bm.read_page(blkno).unwrap();
    let offno = page.add_item(vec![9, 9]).unwrap();
    bm.write_page(blkno, page).unwrap();
    let reread = bm.read_page(blkno).unwrap();
    assert_eq!(reread.get_item(offno).unwrap(), &[9, 9]);
}

#[test]
fn test_buffer_manager_unknown_block_is_corrupt() {
    let bm = InMemoryBufferManager::new();
    let err = bm.read_page(0).unwrap_err();
    assert_eq!(err.code(), "ANNIDX-008");
}

#[test]
fn test_wal_bracket_registers_and_commits() {
    let wal = InMemoryWal::new();
    {
        let bracket = WalBracket::open(&wal);
        let page = Page::new(PageType::HnswElement);
        bracket.register(0, &page);
        bracket.commit();
    }
    assert_eq!(wal.committed_records().len(), 1);
}

#[test]
fn test_hnsw_meta_roundtrips_validity() {
    let meta = HnswMeta::new(768, 16, 64);
    assert!(meta.is_valid());
    let bytes = bincode::serialize(&meta).unwrap();
    let back: HnswMeta = bincode::deserialize(&bytes).unwrap();
    assert!(back.is_valid());
    assert_eq!(back.dimensions, 768);
}

#[test]
fn test_ivf_meta_roundtrips_validity() {
    let meta = IvfMeta::new(128, 100);
    assert!(meta.is_valid());
    let bytes = bincode::serialize(&meta).unwrap();
    let back: IvfMeta = bincode::deserialize(&bytes).unwrap();
    assert!(back.is_valid());
    assert_eq!(back.lists, 100);
}
