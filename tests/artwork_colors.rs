use stemkit::{
    DominantColorOpts, Rgb8, TrackCatalog, TrackSpec, artwork::locate_artwork,
    extract_track_colors,
};

fn catalog() -> TrackCatalog {
    let track = |id: &str, folder: &str, title: &str| TrackSpec {
        id: id.to_owned(),
        folder: folder.to_owned(),
        title: title.to_owned(),
        base_color: "#808080".to_owned(),
        stem_count: 4,
    };
    TrackCatalog::new(vec![
        track("hydrogen", "1.Hydrogen", "Hydrogen"),
        track("lithium", "2.Lithium", "Lithium"),
        track("sodium", "3.Sodium", "Sodium"),
    ])
    .unwrap()
}

#[test]
fn extracts_per_track_and_skips_missing_or_broken_artwork() {
    let root = tempfile::tempdir().unwrap();

    // Primary name for Hydrogen: mostly near-black with a cyan band.
    let art = root.path().join("1.Hydrogen").join("artwork");
    std::fs::create_dir_all(&art).unwrap();
    let img = image::RgbImage::from_fn(150, 150, |_, y| {
        if y < 90 {
            image::Rgb([5, 5, 5])
        } else {
            image::Rgb([37, 218, 240])
        }
    });
    img.save(art.join("Hydrogen.png")).unwrap();

    // Lithium has no artwork at all. Sodium's file is not an image.
    let art = root.path().join("3.Sodium").join("artwork");
    std::fs::create_dir_all(&art).unwrap();
    std::fs::write(art.join("Sodium.png"), b"definitely not a png").unwrap();

    let results =
        extract_track_colors(root.path(), &catalog(), &DominantColorOpts::default()).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].track_name, "Hydrogen");
    assert_eq!(results[0].rgb, Rgb8::new(37, 218, 240));
    assert_eq!(results[0].hex, "#25daf0");
}

#[test]
fn primary_artwork_name_is_preferred_over_fallback() {
    let root = tempfile::tempdir().unwrap();
    let art = root.path().join("2.Lithium").join("artwork");
    std::fs::create_dir_all(&art).unwrap();
    std::fs::write(art.join("Lithium.png"), b"x").unwrap();
    std::fs::write(art.join("Lithium-1000x1000.png"), b"x").unwrap();

    let catalog = catalog();
    let track = &catalog.tracks()[1];
    assert_eq!(
        locate_artwork(root.path(), track),
        Some(art.join("Lithium.png"))
    );

    std::fs::remove_file(art.join("Lithium.png")).unwrap();
    assert_eq!(
        locate_artwork(root.path(), track),
        Some(art.join("Lithium-1000x1000.png"))
    );
}
