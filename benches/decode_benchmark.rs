use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lib3mf_stream::Model;
use std::hint::black_box;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const MODEL_REL: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

/// A model part holding one mesh object with the given number of vertices and triangles
fn mesh_part(vertices: usize, triangles: usize, build: &str) -> String {
    let mut model_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02" xmlns:p="http://schemas.microsoft.com/3dmanufacturing/production/2015/06">
    <resources>
        <object id="1" type="model">
            <mesh>
                <vertices>
"#,
    );

    // Grid of vertices
    for i in 0..vertices {
        let x = (i % 100) as f64;
        let y = (i / 100) as f64;
        model_xml.push_str(&format!(
            "                    <vertex x=\"{}\" y=\"{}\" z=\"0\"/>\n",
            x, y
        ));
    }

    model_xml.push_str(
        r#"                </vertices>
                <triangles>
"#,
    );

    for i in 0..triangles {
        let base = (i * 3) % (vertices.saturating_sub(2));
        model_xml.push_str(&format!(
            "                    <triangle v1=\"{}\" v2=\"{}\" v3=\"{}\"/>\n",
            base,
            base + 1,
            base + 2
        ));
    }

    model_xml.push_str(
        r#"                </triangles>
            </mesh>
        </object>
    </resources>
"#,
    );
    model_xml.push_str(build);
    model_xml.push_str("\n</model>");
    model_xml
}

/// Generate a package whose root part builds one item per child part
fn generate_3mf(parts: usize, vertices: usize, triangles: usize) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default();

    let content_types = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#;
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(content_types.as_bytes()).unwrap();

    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rel0" Target="/3D/3dmodel.model" Type="{}"/>
</Relationships>"#,
        MODEL_REL
    );
    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();

    let mut build = String::from("    <build>\n        <item objectid=\"1\"/>\n");
    for part in 0..parts {
        build.push_str(&format!(
            "        <item objectid=\"1\" p:path=\"/3D/parts/part{}.model\"/>\n",
            part
        ));
    }
    build.push_str("    </build>");

    zip.start_file("3D/3dmodel.model", options).unwrap();
    zip.write_all(mesh_part(vertices, triangles, &build).as_bytes())
        .unwrap();

    for part in 0..parts {
        zip.start_file(format!("3D/parts/part{}.model", part), options)
            .unwrap();
        zip.write_all(mesh_part(vertices, triangles, "").as_bytes())
            .unwrap();
    }

    zip.finish().unwrap();
    buffer
}

fn bench_decode_single_part(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_single_part");

    for &(vertices, triangles) in &[(100, 50), (1000, 500), (10000, 5000)] {
        let data = generate_3mf(0, vertices, triangles);

        group.bench_with_input(
            BenchmarkId::new(
                "vertices_triangles",
                format!("{}v_{}t", vertices, triangles),
            ),
            &data,
            |b, data| {
                b.iter(|| black_box(Model::from_reader(Cursor::new(data.clone())).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_decode_multi_part(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_multi_part");
    group.sample_size(20);

    for &parts in &[1, 4, 16] {
        let data = generate_3mf(parts, 5000, 2500);

        group.bench_with_input(BenchmarkId::new("parts", parts), &data, |b, data| {
            b.iter(|| black_box(Model::from_reader(Cursor::new(data.clone())).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode_single_part, bench_decode_multi_part);
criterion_main!(benches);
