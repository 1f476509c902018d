//! Format and mount related tests

use fat_engine::{format, BlockDevice, BlockIdx, Error, FatFileSystem, FatType, RamDisk};

mod utils;

#[test]
fn mount_fresh_fat12() {
    let mut disk = utils::small_fat12_disk();
    let (fs, root) = FatFileSystem::mount(&mut disk, utils::make_time_source()).expect("mount");
    assert_eq!(fs.fat_type(), FatType::Fat12);
    assert_eq!(fs.eoc_marker(), 0xFFF);
    assert_eq!(fs.bpb().cluster_count(), 4047);
    assert_eq!(fs.free_clusters().count(), 4047);
    assert_eq!(fs.volume_label(), b"NO NAME    ");
    assert!(root.is_root());
    assert_eq!(root, fs.root());

    // only metadata is in use
    let (total, used) = fs.free_space();
    assert_eq!(total, 4096);
    assert_eq!(used, 4096 - 4047);

    // the volume label is not listed
    let mut count = 0;
    fs.read_dir(&root, |_| count += 1).expect("read_dir");
    assert_eq!(count, 0);
    fs.unmount();
}

#[test]
fn mount_fresh_fat16() {
    let mut disk = utils::formatted_disk(65_536, FatType::Fat16);
    let (fs, _root) = FatFileSystem::mount(&mut disk, utils::make_time_source()).expect("mount");
    assert_eq!(fs.fat_type(), FatType::Fat16);
    assert_eq!(fs.bpb().sectors_per_cluster, 4);
    assert_eq!(fs.bytes_per_cluster(), 2048);
    assert_eq!(fs.eoc_marker(), 0xFFFF);
    assert!(fs.volume_flags().clean_shutdown);
    assert_eq!(fs.free_clusters().count(), fs.bpb().cluster_count());
}

#[test]
fn format_picks_type_from_size() {
    let mut disk = RamDisk::new(2880, 512);
    let bpb = format(&mut disk, None).expect("format");
    assert_eq!(bpb.fat_type(), FatType::Fat12);

    let mut disk = RamDisk::new(30_000, 512);
    let bpb = format(&mut disk, None).expect("format");
    assert_eq!(bpb.fat_type(), FatType::Fat16);
}

#[test]
fn fat12_request_on_larger_disk_gives_fat16() {
    // the FAT is sized for 16 bit entries, so the cluster count decides
    let mut disk = RamDisk::new(6000, 512);
    let bpb = format(&mut disk, Some(FatType::Fat12)).expect("format");
    assert_eq!(bpb.fat_type(), FatType::Fat16);
    let (mut fs, root) = FatFileSystem::mount(&mut disk, utils::make_time_source()).expect("mount");
    assert_eq!(fs.fat_type(), FatType::Fat16);
    let mut file = fs.create(&root, "A.BIN").expect("create");
    let data = utils::pattern(3000, 1);
    assert_eq!(fs.write(&mut file, 0, &data).expect("write"), 3000);
    let mut back = vec![0u8; 3000];
    assert_eq!(fs.read(&file, 0, &mut back).expect("read"), 3000);
    assert_eq!(back, data);
}

#[test]
fn format_rejects_disk_size_out_of_range() {
    let mut disk = RamDisk::new(4000, 512);
    assert!(matches!(
        format(&mut disk, Some(FatType::Fat16)),
        Err(Error::DiskSizeOutOfRange)
    ));
    assert!(matches!(
        format(&mut disk, Some(FatType::Fat32)),
        Err(Error::DiskSizeOutOfRange)
    ));
    // nothing was written
    assert!(disk.as_bytes().iter().all(|b| *b == 0));
}

#[test]
fn mount_rejects_blank_disk() {
    let mut disk = RamDisk::new(4096, 512);
    assert!(matches!(
        FatFileSystem::mount(&mut disk, utils::make_time_source()),
        Err(Error::InvalidBpb)
    ));
}

#[test]
fn mount_rejects_bad_jump() {
    let mut disk = utils::small_fat12_disk();
    let mut sector = [0u8; 512];
    disk.read_sector(BlockIdx(0), &mut sector).unwrap();
    sector[2] = 0x00;
    disk.write_sector(BlockIdx(0), &sector).unwrap();
    assert!(matches!(
        FatFileSystem::mount(&mut disk, utils::make_time_source()),
        Err(Error::InvalidBpb)
    ));
    // a near jump is accepted
    sector[0] = 0xE9;
    disk.write_sector(BlockIdx(0), &sector).unwrap();
    assert!(FatFileSystem::mount(&mut disk, utils::make_time_source()).is_ok());
}

#[test]
fn mount_rejects_sector_size_mismatch() {
    let image = utils::small_fat12_disk().into_inner();
    let mut disk = RamDisk::from_image(image, 1024);
    assert!(matches!(
        FatFileSystem::mount(&mut disk, utils::make_time_source()),
        Err(Error::InvalidBpb)
    ));
}

#[test]
fn fat32_has_no_root() {
    let mut disk = RamDisk::new(70_000, 512);
    let bpb = format(&mut disk, Some(FatType::Fat32)).expect("format");
    assert_eq!(bpb.fat_type(), FatType::Fat32);
    assert_eq!(&disk.as_bytes()[32 * 512..32 * 512 + 8], &hex_literal::hex!("F8 FF FF 0F FF FF FF 0F"));

    let (mut fs, root) = FatFileSystem::mount(&mut disk, utils::make_time_source()).expect("mount");
    assert_eq!(fs.fat_type(), FatType::Fat32);
    assert_eq!(fs.eoc_marker(), 0x0FFF_FFFF);
    assert_eq!(fs.free_clusters().count(), fs.bpb().cluster_count());
    assert!(matches!(fs.lookup(&root, "A"), Err(Error::UnsupportedFatType)));
    assert!(matches!(fs.create(&root, "A"), Err(Error::UnsupportedFatType)));
    assert!(matches!(fs.mkdir(&root, "D"), Err(Error::UnsupportedFatType)));
    assert!(matches!(
        fs.read_dir(&root, |_| {}),
        Err(Error::UnsupportedFatType)
    ));
    // nothing was allocated by the failed calls
    assert_eq!(fs.free_clusters().count(), fs.bpb().cluster_count());
}

#[test]
fn device_error_during_mount() {
    let mut disk = utils::FaultyDisk::new(utils::small_fat12_disk());
    disk.fail_reads_after(0);
    assert!(matches!(
        FatFileSystem::mount(&mut disk, utils::make_time_source()),
        Err(Error::DeviceIoError(utils::FaultyDiskError::Injected))
    ));
}

#[test]
fn remount_keeps_contents() {
    let mut disk = utils::small_fat12_disk();
    {
        let (mut fs, root) =
            FatFileSystem::mount(&mut disk, utils::make_time_source()).expect("mount");
        let mut file = fs.create(&root, "KEEP.TXT").expect("create");
        fs.write(&mut file, 0, b"persistent").expect("write");
        fs.unmount();
    }
    let (fs, root) = FatFileSystem::mount(&mut disk, utils::make_time_source()).expect("mount");
    let file = fs.lookup(&root, "keep.txt").expect("lookup");
    assert_eq!(file.size(), 10);
    let mut buffer = [0u8; 10];
    assert_eq!(fs.read(&file, 0, &mut buffer).expect("read"), 10);
    assert_eq!(&buffer, b"persistent");
    assert_eq!(fs.free_clusters().count(), 4046);
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
