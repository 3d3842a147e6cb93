// xfl-data: Serde structs for authored vector-animation documents
pub mod model;

#[cfg(test)]
mod tests {
    use super::model::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let data = json!({
            "width": 550,
            "height": 400,
            "timelines": [
                { "name": "Scene 1", "total_frames": 10, "layers": [] }
            ]
        });
        let doc: Document = serde_json::from_value(data).unwrap();
        assert_eq!(doc.width, 550.0);
        assert_eq!(doc.frame_rate, 24.0);
        assert_eq!(doc.background_color, "#FFFFFF");
        assert_eq!(doc.main_timeline().unwrap().frame_count(), 10);
    }

    #[test]
    fn test_deserialize_shape_frame() {
        let data = json!({
            "name": "Layer 1",
            "frames": [
                {
                    "index": 0,
                    "duration": 5,
                    "tween": "motion",
                    "easing": { "acceleration": -50 },
                    "elements": [
                        {
                            "type": "shape",
                            "matrix": { "tx": 10, "ty": 20 },
                            "fills": [ { "type": "solid", "color": "#FF0000" } ],
                            "edges": [
                                {
                                    "fill_left": 0,
                                    "commands": [
                                        { "op": "move_to", "pts": [0, 0] },
                                        { "op": "line_to", "pts": [100, 0] },
                                        { "op": "quad_to", "pts": [[100, 50], [100, 100]] },
                                        { "op": "close" }
                                    ]
                                }
                            ]
                        }
                    ]
                }
            ]
        });
        let layer: Layer = serde_json::from_value(data).unwrap();
        assert_eq!(layer.kind, LayerKind::Normal);
        let frame = &layer.frames[0];
        assert_eq!(frame.tween, TweenKind::Motion);
        assert_eq!(frame.easing, Some(Easing::Acceleration(-50.0)));
        assert_eq!(frame.end(), 5);
        if let Element::Shape(shape) = &frame.elements[0] {
            assert_eq!(shape.matrix.a, 1.0);
            assert_eq!(shape.matrix.tx, 10.0);
            assert_eq!(shape.edges[0].commands.len(), 4);
            assert_eq!(
                shape.edges[0].commands[2],
                PathCommand::QuadTo(Point::new(100.0, 50.0), Point::new(100.0, 100.0))
            );
            assert_eq!(shape.edges[0].commands[3], PathCommand::Close);
        } else {
            panic!("Expected shape, got {:?}", frame.elements[0]);
        }
    }

    #[test]
    fn test_null_coordinate_reads_as_non_finite() {
        let cmd: PathCommand =
            serde_json::from_value(json!({ "op": "line_to", "pts": [null, 4] })).unwrap();
        match cmd {
            PathCommand::LineTo(p) => {
                assert!(p.x.is_nan());
                assert_eq!(p.y, 4.0);
                assert!(!p.is_finite());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_symbol_instance_defaults() {
        let el: Element = serde_json::from_value(json!({
            "type": "symbol",
            "symbol": "Walk Cycle",
            "first_frame": 3,
            "loop_mode": "single_frame",
            "filters": [ { "type": "blur", "blur_x": 2 } ]
        }))
        .unwrap();
        match el {
            Element::Symbol(inst) => {
                assert_eq!(inst.loop_mode, LoopMode::SingleFrame);
                assert_eq!(inst.first_frame, 3);
                assert_eq!(inst.matrix, Matrix::IDENTITY);
                assert_eq!(
                    inst.filters[0],
                    Filter::Blur {
                        blur_x: 2.0,
                        blur_y: 5.0
                    }
                );
            }
            other => panic!("Expected symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_frame_count_falls_back_to_layer_spans() {
        let timeline = Timeline {
            layers: vec![Layer {
                frames: vec![
                    Frame {
                        index: 0,
                        duration: 4,
                        ..Default::default()
                    },
                    Frame {
                        index: 4,
                        duration: 6,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(timeline.frame_count(), 10);
    }

    #[test]
    fn test_frame_count_saturates_at_the_last_index() {
        let timeline = Timeline {
            layers: vec![Layer {
                frames: vec![Frame {
                    index: u32::MAX - 1,
                    duration: 8,
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(timeline.frame_count(), u32::MAX);
    }

    #[test]
    fn test_sound_duration() {
        let sound = Sound {
            name: "beep".into(),
            sample_rate: 100,
            channels: 2,
            samples: vec![0.0; 400],
        };
        assert_eq!(sound.duration_secs(), 2.0);
    }
}
