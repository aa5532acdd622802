//! Parser tests against captured ffprobe/ffmpeg diagnostic output.

use ffscribe_probe::{parse, Extracted, Resolution, StreamKind};

fn crlf(lines: &[&str]) -> String {
    lines.join("\r\n")
}

/// `ffprobe -i naruto.mp4` on Windows, ffprobe 4.2.1.
fn naruto_windows() -> String {
    crlf(&[
        "ffprobe version 4.2.1 Copyright (c) 2007-2019 the FFmpeg developers",
        "  built with gcc 9.1.1 (GCC) 20190807",
        "  configuration: --enable-gpl --enable-version3 --enable-sdl2 --enable-libx264",
        "  libavutil      56. 31.100 / 56. 31.100",
        "  libavcodec     58. 54.100 / 58. 54.100",
        "  libavformat    58. 29.100 / 58. 29.100",
        "  libavdevice    58.  8.100 / 58.  8.100",
        "  libavfilter     7. 57.100 /  7. 57.100",
        "  libswscale      5.  5.100 /  5.  5.100",
        "  libswresample   3.  5.100 /  3.  5.100",
        "  libpostproc    55.  5.100 / 55.  5.100",
        r"Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'C:\res\movies\anime\720p\naruto.mp4':",
        "  Metadata:",
        "    major_brand     : isom",
        "    minor_version   : 512",
        "    compatible_brands: isomiso2avc1mp41",
        "    encoder         : Lavf58.29.100",
        "  Duration: 00:23:40.06, start: 0.000000, bitrate: 1108 kb/s",
        "    Stream #0:0(und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 1280x720 [SAR 1:1 DAR 16:9], 976 kb/s, 23.98 fps, 23.98 tbr, 24k tbn, 47.95 tbc (default)",
        "    Metadata:",
        "      handler_name    : VideoHandler",
        "    Stream #0:1(und): Audio: aac (LC) (mp4a / 0x6134706D), 44100 Hz, stereo, fltp, 127 kb/s (default)",
        "    Metadata:",
        "      handler_name    : SoundHandler",
        "",
    ])
}

/// `ffmpeg -i S01E01.mkv -i commentary.wav` on Linux.
fn two_inputs_unix() -> String {
    [
        "ffmpeg version 6.1.1 Copyright (c) 2000-2023 the FFmpeg developers",
        "  built with gcc 13.2.0 (GCC)",
        "  configuration: --prefix=/usr --enable-gpl --enable-libx265",
        "  libavutil      58. 29.100 / 58. 29.100",
        "  libavcodec     60. 31.102 / 60. 31.102",
        "  libavformat    60. 16.100 / 60. 16.100",
        "Input #0, matroska,webm, from '/media/show/S01E01.mkv':",
        "  Metadata:",
        "    title           : Pilot",
        "    ENCODER         : Lavf60.16.100",
        "  Duration: 00:42:10.50, start: 0.000000, bitrate: 4200 kb/s",
        "  Stream #0:0: Video: hevc (Main 10), yuv420p10le(tv, bt2020nc/bt2020/smpte2084), 1920x1080 [SAR 1:1 DAR 16:9], 23.98 fps, 23.98 tbr, 1k tbn (default)",
        "      Metadata:",
        "        BPS             : 3800000",
        "        DURATION        : 00:42:10.500000000",
        "  Stream #0:1(eng): Audio: eac3, 48000 Hz, 5.1(side), fltp, 640 kb/s (default)",
        "      Metadata:",
        "        title           : English",
        "  Stream #0:2(eng): Subtitle: subrip",
        "      Metadata:",
        "        title           : English SDH",
        "Input #1, wav, from 'commentary.wav':",
        "  Duration: 00:42:00.00, bitrate: 1536 kb/s",
        "  Stream #1:0: Audio: pcm_s16le ([1][0][0][0] / 0x0001), 48000 Hz, 2 channels, s16, 1536 kb/s",
        "At least one output file must be specified",
        "",
    ]
    .join("\n")
}

/// Synthetic output with `inputs` inputs of `streams` streams each.
fn generated(inputs: usize, streams: usize) -> String {
    let mut lines = Vec::new();
    for n in 0..inputs {
        lines.push(format!("Input #{n}, matroska,webm, from 'file{n}.mkv':"));
        lines.push(format!(
            "  Duration: 00:0{n}:00.00, start: 0.000000, bitrate: {} kb/s",
            100 + n
        ));
        for m in 0..streams {
            if m == 0 {
                lines.push(format!(
                    "    Stream #{n}:{m}: Video: h264, yuv420p, {}x{} [SAR 1:1 DAR 16:9], {n}{m}1 kb/s",
                    640 + n,
                    360 + n
                ));
            } else {
                lines.push(format!(
                    "    Stream #{n}:{m}(eng): Audio: aac, 48000 Hz, stereo, fltp, {n}{m}2 kb/s"
                ));
            }
        }
    }
    lines.join("\r\n")
}

#[test]
fn test_build_info() {
    let meta = parse(&naruto_windows());

    assert_eq!(meta.tool_version.as_deref(), Some("4.2.1"));
    assert_eq!(
        meta.build_info["configuration"],
        Extracted::Sequence(vec![
            "enable-gpl".into(),
            "enable-version3".into(),
            "enable-sdl2".into(),
            "enable-libx264".into(),
        ])
    );
    assert_eq!(
        meta.build_info["libavutil"],
        Extracted::Scalar("56. 31.100 / 56. 31.100".into())
    );
    assert_eq!(
        meta.build_info["libavfilter"],
        Extracted::Scalar("7. 57.100 /  7. 57.100".into())
    );
    assert_eq!(
        meta.build_info["libpostproc"],
        Extracted::Scalar("55.  5.100 / 55.  5.100".into())
    );
    assert_eq!(meta.build_info.len(), 9);
}

#[test]
fn test_windows_input() {
    let meta = parse(&naruto_windows());
    assert_eq!(meta.inputs.len(), 1);

    let input = &meta.inputs[0];
    assert_eq!(input.index, 0);
    assert_eq!(input.file_path, r"C:\res\movies\anime\720p\naruto.mp4");
    assert_eq!(input.file_name, "naruto.mp4");
    assert_eq!(input.container_format, "mp4");
    assert_eq!(input.formats, vec!["mov", "mp4", "m4a", "3gp", "3g2", "mj2"]);

    assert_eq!(input.tags["major_brand"], "isom");
    assert_eq!(input.tags["minor_version"], "512");
    assert_eq!(input.tags["compatible_brands"], "isomiso2avc1mp41");
    assert_eq!(input.tags["encoder"], "Lavf58.29.100");
    assert_eq!(input.duration(), Some("00:23:40.06"));
    assert_eq!(input.start(), Some("0.000000"));
    assert_eq!(input.bitrate(), Some("1108 kb/s"));

    assert_eq!(input.resolution, Some(Resolution::new(1280, 720)));
    assert_eq!(meta.primary_resolution(), Some(Resolution::new(1280, 720)));
}

#[test]
fn test_windows_streams() {
    let meta = parse(&naruto_windows());
    let input = &meta.inputs[0];

    let keys: Vec<&str> = input.streams.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["0:0", "0:1"]);

    let video = input.stream("0:0").unwrap();
    assert_eq!(video.kind, StreamKind::Video);
    assert_eq!(video.language.as_deref(), Some("und"));
    assert_eq!(video.codec(), Some("h264"));
    assert_eq!(video.descriptor_lines[0], "h264 (High) (avc1 / 0x31637661)");
    assert_eq!(video.descriptor_lines[2], "1280x720 [SAR 1:1 DAR 16:9]");
    assert_eq!(video.descriptor_lines.len(), 8);
    assert_eq!(video.resolution, Some(Resolution::new(1280, 720)));
    assert_eq!(video.tags.len(), 1);
    assert_eq!(video.tags["handler_name"], "VideoHandler");

    let audio = input.stream("0:1").unwrap();
    assert_eq!(audio.kind, StreamKind::Audio);
    assert_eq!(audio.codec(), Some("aac"));
    assert_eq!(
        audio.descriptor_lines,
        vec![
            "aac (LC) (mp4a / 0x6134706D)",
            "44100 Hz",
            "stereo",
            "fltp",
            "127 kb/s (default)",
        ]
    );
    assert!(audio.resolution.is_none());
    assert_eq!(audio.tags["handler_name"], "SoundHandler");
}

#[test]
fn test_two_inputs() {
    let meta = parse(&two_inputs_unix());

    assert_eq!(meta.tool_version.as_deref(), Some("6.1.1"));
    assert_eq!(
        meta.build_info["configuration"].as_sequence().unwrap(),
        ["prefix=/usr", "enable-gpl", "enable-libx265"]
    );
    assert!(!meta.build_info.contains_key("libpostproc"));
    assert_eq!(meta.inputs.len(), 2);

    let show = &meta.inputs[0];
    assert_eq!(show.file_name, "S01E01.mkv");
    assert_eq!(show.container_format, "mkv");
    assert_eq!(show.tags["title"], "Pilot");
    assert_eq!(show.duration(), Some("00:42:10.50"));
    assert_eq!(show.streams.len(), 3);
    assert_eq!(show.resolution, Some(Resolution::new(1920, 1080)));

    let video = show.stream("0:0").unwrap();
    assert_eq!(video.codec(), Some("hevc"));
    assert!(video.language.is_none());
    assert_eq!(video.tags["BPS"], "3800000");
    assert_eq!(video.tags["DURATION"], "00:42:10.500000000");

    let audio = show.stream("0:1").unwrap();
    assert_eq!(audio.kind, StreamKind::Audio);
    assert_eq!(audio.language.as_deref(), Some("eng"));
    assert_eq!(audio.tags["title"], "English");

    let subs = show.stream("0:2").unwrap();
    assert_eq!(subs.kind, StreamKind::Subtitle);
    assert_eq!(subs.descriptor_lines, vec!["subrip"]);
    assert_eq!(subs.tags["title"], "English SDH");

    let commentary = &meta.inputs[1];
    assert_eq!(commentary.index, 1);
    assert_eq!(commentary.file_path, "commentary.wav");
    assert_eq!(commentary.container_format, "wav");
    assert_eq!(commentary.formats, vec!["wav"]);
    assert_eq!(commentary.duration(), Some("00:42:00.00"));
    assert_eq!(commentary.bitrate(), Some("1536 kb/s"));
    assert!(commentary.start().is_none());
    assert_eq!(commentary.streams.len(), 1);
    assert!(commentary.resolution.is_none());

    let pcm = commentary.stream("1:0").unwrap();
    assert_eq!(pcm.kind, StreamKind::Audio);
    assert!(pcm.tags.is_empty());
}

#[test]
fn test_input_and_stream_counts_follow_declaration_order() {
    for (inputs, streams) in [(1, 1), (2, 3), (3, 5), (4, 0)] {
        let meta = parse(&generated(inputs, streams));
        assert_eq!(meta.inputs.len(), inputs, "{inputs}x{streams}");

        for (n, input) in meta.inputs.iter().enumerate() {
            assert_eq!(input.index, n);
            assert_eq!(input.file_name, format!("file{n}.mkv"));
            assert_eq!(input.streams.len(), streams, "input {n} of {inputs}x{streams}");

            for (m, (key, stream)) in input.streams.iter().enumerate() {
                assert_eq!(key, &format!("{n}:{m}"));
                assert_eq!(stream.index, m);
                let expected = if m == 0 {
                    StreamKind::Video
                } else {
                    StreamKind::Audio
                };
                assert_eq!(stream.kind, expected);
            }

            if streams > 0 {
                assert_eq!(
                    input.resolution,
                    Some(Resolution::new(640 + n as u32, 360 + n as u32))
                );
            } else {
                assert!(input.resolution.is_none());
            }
        }
    }
}

#[test]
fn test_resolution_from_sar_dar() {
    let text = "Input #0, mov,mp4, from 'hd.mp4':\r\n    \
                Stream #0:0: Video: h264, yuv420p, 1920x1080 [SAR 1:1 DAR 16:9], 5000 kb/s\r\n";
    let meta = parse(text);
    let stream = meta.inputs[0].stream("0:0").unwrap();
    assert_eq!(stream.resolution, Some(Resolution::new(1920, 1080)));
}

#[test]
fn test_resolution_requires_sar_or_dar() {
    let text = "Input #0, image2, from 'cover.jpg':\r\n    \
                Stream #0:0: Video: mjpeg, yuvj420p(pc), 600x800, 25 tbr\r\n";
    let meta = parse(text);
    let input = &meta.inputs[0];
    assert!(input.stream("0:0").unwrap().resolution.is_none());
    assert!(input.resolution.is_none());
}

#[test]
fn test_malformed_resolution_is_unset() {
    let text = "Input #0, mov, from 'odd.mov':\r\n    \
                Stream #0:0: Video: h264, yuv420p, ?x? [SAR 1:1 DAR 16:9]\r\n";
    let meta = parse(text);
    assert!(meta.inputs[0].stream("0:0").unwrap().resolution.is_none());
}

#[test]
fn test_no_input_marker_yields_empty_inputs() {
    let text = crlf(&[
        "ffprobe version 4.2.1 Copyright (c) 2007-2019 the FFmpeg developers",
        "  libavutil      56. 31.100 / 56. 31.100",
        "missing.mp4: No such file or directory",
    ]);
    let meta = parse(&text);
    assert!(meta.inputs.is_empty());
    assert!(meta.is_empty());
    assert_eq!(meta.build_info.len(), 1);
}

#[test]
fn test_file_name_without_extension() {
    let text = "Input #0, mpegts, from 'udp_capture':\r\n    \
                Stream #0:0[0x100]: Video: mpeg2video (Main), yuv420p(tv, top first), 720x576 [SAR 16:15 DAR 4:3], 25 fps\r\n";
    let meta = parse(text);
    let input = &meta.inputs[0];
    assert_eq!(input.file_name, "udp_capture");
    assert_eq!(input.container_format, "");
    assert_eq!(input.resolution, Some(Resolution::new(720, 576)));
}

#[test]
fn test_comma_in_file_name() {
    let text = crlf(&[
        "Input #0, matroska,webm, from '/media/Movie, The.mkv':",
        "  Duration: 01:52:10.00, start: 0.000000, bitrate: 6120 kb/s",
        "  Stream #0:0: Video: h264 (High), yuv420p(progressive), 1920x800 [SAR 1:1 DAR 12:5], 23.98 fps",
    ]);
    let meta = parse(&text);
    let input = meta.input(0).unwrap();
    assert_eq!(input.file_path, "/media/Movie, The.mkv");
    assert_eq!(input.file_name, "Movie, The.mkv");
    assert_eq!(input.container_format, "mkv");
    assert_eq!(input.formats, vec!["matroska", "webm"]);
    assert_eq!(input.streams.len(), 1);
}

#[test]
fn test_chapters_stay_out_of_input_and_stream_tags() {
    let text = crlf(&[
        "Input #0, matroska,webm, from '/media/movie.mkv':",
        "  Metadata:",
        "    title           : The Movie",
        "    ENCODER         : Lavf60.16.100",
        "  Duration: 01:00:00.00, start: 0.000000, bitrate: 5000 kb/s",
        "  Chapters:",
        "    Chapter #0:0: start 0.000000, end 300.000000",
        "      Metadata:",
        "        title           : Opening",
        "    Chapter #0:1: start 300.000000, end 3600.000000",
        "      Metadata:",
        "        title           : Main Feature",
        "  Stream #0:0: Video: h264 (High), yuv420p(progressive), 1920x1080 [SAR 1:1 DAR 16:9], 23.98 fps",
        "    Metadata:",
        "      title           : Main video",
        "  Stream #0:1(eng): Audio: aac (LC), 48000 Hz, stereo, fltp",
    ]);
    let meta = parse(&text);
    let input = meta.input(0).unwrap();

    assert_eq!(input.tags["title"], "The Movie");
    assert_eq!(input.duration(), Some("01:00:00.00"));
    assert_eq!(input.bitrate(), Some("5000 kb/s"));
    assert!(input.tags.keys().all(|k| !k.starts_with("Chapter")), "{:?}", input.tags);

    assert_eq!(input.chapters.len(), 2);
    assert_eq!(input.chapters[0].title(), Some("Opening"));
    assert_eq!(input.chapters[0].start.as_deref(), Some("0.000000"));
    assert_eq!(input.chapters[0].end.as_deref(), Some("300.000000"));
    assert_eq!(input.chapters[1].index, 1);
    assert_eq!(input.chapters[1].title(), Some("Main Feature"));

    assert_eq!(input.streams.len(), 2);
    let video = input.stream("0:0").unwrap();
    assert_eq!(video.tags.len(), 1);
    assert_eq!(video.tags["title"], "Main video");
    assert!(input.stream("0:1").unwrap().tags.is_empty());
}

#[test]
fn test_zero_stream_input_between_inputs() {
    let text = crlf(&[
        "Input #0, ffmetadata, from 'chapters.txt':",
        "  Metadata:",
        "    title           : Chapters",
        "  Duration: N/A, bitrate: N/A",
        "Input #1, mov,mp4, from 'clip.mp4':",
        "  Duration: 00:00:30.00, start: 0.000000, bitrate: 800 kb/s",
        "    Stream #1:0(und): Video: h264, yuv420p, 640x480 [SAR 1:1 DAR 4:3], 700 kb/s",
    ]);
    let meta = parse(&text);
    assert_eq!(meta.inputs.len(), 2);

    let chapters = &meta.inputs[0];
    assert!(chapters.streams.is_empty());
    assert_eq!(chapters.tags["title"], "Chapters");
    assert_eq!(chapters.duration(), Some("N/A"));

    let clip = &meta.inputs[1];
    assert_eq!(clip.duration(), Some("00:00:30.00"));
    assert_eq!(clip.streams.len(), 1);
    assert_eq!(clip.resolution, Some(Resolution::new(640, 480)));
}

#[cfg(feature = "serde")]
#[test]
fn test_serialize_metadata() {
    let meta = parse(&naruto_windows());
    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["inputs"][0]["container_format"], "mp4");
    assert_eq!(json["inputs"][0]["resolution"]["width"], 1280);
    assert_eq!(json["build_info"]["libavutil"], "56. 31.100 / 56. 31.100");
}
